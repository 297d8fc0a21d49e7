//! Narration runner: wires text, engine, session, and controls together.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::Context;
use calmvox_narration::{NarrationConfig, NarrationEvent, NarrationSession, PlaybackState};
use calmvox_synth::{EventReceiver, SynthesisEvent, VoiceGender, VoiceInfo};
use calmvox_synth_espeak::EspeakEngine;
use tokio::sync::mpsc;

use crate::keys::{self, ControlCommand};

const RATE_STEP: f32 = 0.25;

/// Narrate the given file (or stdin) through espeak.
pub async fn narrate(
    file: &str,
    voice: Option<String>,
    rate: f32,
    language: String,
    no_input: bool,
) -> anyhow::Result<()> {
    let text = read_text(file)?;

    let config = NarrationConfig {
        rate,
        preferred_language: language,
        voice,
        ..NarrationConfig::default()
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let engine = EspeakEngine::spawn(event_tx).context("starting synthesis engine")?;
    let mut session = NarrationSession::new(Box::new(engine), &text, &config);

    if session.sentence_count() == 0 {
        println!("Nothing to narrate: no sentences found in {}", file);
        return Ok(());
    }
    tracing::info!(
        "Narrating {} sentences from {}",
        session.sentence_count(),
        file
    );

    if no_input {
        return narrate_to_completion(&mut session, &mut event_rx).await;
    }
    narrate_interactive(&mut session, &mut event_rx).await
}

/// Print the voices espeak reports, as a table or as JSON.
pub async fn list_voices(json: bool) -> anyhow::Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let _engine = EspeakEngine::spawn(event_tx).context("starting synthesis engine")?;

    // Discovery runs in the background; the first VoicesChanged event
    // carries the full list.
    let voices = loop {
        match tokio::time::timeout(Duration::from_secs(5), event_rx.recv()).await {
            Ok(Some(SynthesisEvent::VoicesChanged(voices))) => break voices,
            Ok(Some(_)) => continue,
            Ok(None) => anyhow::bail!("synthesis engine exited before reporting voices"),
            Err(_) => anyhow::bail!("timed out waiting for voice discovery"),
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
        return Ok(());
    }

    println!("{:<28} {:<16} {:<8} NAME", "ID", "LANGUAGE", "GENDER");
    for voice in &voices {
        let gender = match voice.gender {
            Some(VoiceGender::Female) => "female",
            Some(VoiceGender::Male) => "male",
            _ => "-",
        };
        println!(
            "{:<28} {:<16} {:<8} {}",
            voice.id, voice.language, gender, voice.name
        );
    }
    println!("{} voices", voices.len());
    Ok(())
}

/// Play every sentence to the end without keyboard controls.
async fn narrate_to_completion(
    session: &mut NarrationSession,
    event_rx: &mut EventReceiver,
) -> anyhow::Result<()> {
    session.play()?;
    if let Some(sentence) = session.current_sentence() {
        println!("[1/{}] {}", session.sentence_count(), sentence);
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let event = match event {
                    Some(event) => event,
                    None => anyhow::bail!("synthesis engine event channel closed"),
                };
                match session.handle_synthesis_event(event) {
                    Some(NarrationEvent::SentenceChanged { index }) => {
                        println!(
                            "[{}/{}] {}",
                            index + 1,
                            session.sentence_count(),
                            session.current_sentence().unwrap_or("")
                        );
                    }
                    Some(NarrationEvent::Completed) => break,
                    Some(NarrationEvent::Halted { index, error }) => {
                        anyhow::bail!("playback halted at sentence {}: {}", index + 1, error);
                    }
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, cancelling narration");
                session.stop()?;
                break;
            }
        }
    }
    Ok(())
}

/// Drive narration under keyboard control until the user quits.
async fn narrate_interactive(
    session: &mut NarrationSession,
    event_rx: &mut EventReceiver,
) -> anyhow::Result<()> {
    let _raw = keys::RawModeGuard::enable().context("entering raw terminal mode")?;
    let mut commands = keys::spawn_key_thread();

    print_line(&format!(
        "Narrating {} sentences. space pause/resume  n/p seek  +/- rate  v voice  s stop  q quit",
        session.sentence_count()
    ));

    session.play()?;
    show_sentence(session);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        match session.handle_synthesis_event(event) {
                            Some(NarrationEvent::SentenceChanged { .. }) => show_sentence(session),
                            Some(NarrationEvent::Completed) => {
                                print_line("Narration complete. space replays, q quits.");
                            }
                            Some(NarrationEvent::Halted { index, error }) => {
                                print_line(&format!(
                                    "Playback halted at sentence {}: {}",
                                    index + 1,
                                    error
                                ));
                                print_line("space retries the sentence, q quits.");
                            }
                            None => {}
                        }
                    }
                    None => break,
                }
            }
            command = commands.recv() => {
                match command {
                    Some(command) => {
                        if handle_command(session, command)? {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                print_line("Interrupted.");
                break;
            }
        }
    }

    session.stop()?;
    Ok(())
}

/// Apply one keyboard command; returns true when the user asked to quit.
fn handle_command(session: &mut NarrationSession, command: ControlCommand) -> anyhow::Result<bool> {
    match command {
        ControlCommand::TogglePause => {
            if session.state() == PlaybackState::Playing {
                session.pause()?;
                show_status(session, "paused");
            } else {
                session.play()?;
                show_status(session, "playing");
            }
        }
        ControlCommand::NextSentence => {
            let last = session.sentence_count().saturating_sub(1);
            let next = (session.current_index() + 1).min(last);
            session.seek_to_sentence(next)?;
            show_sentence(session);
        }
        ControlCommand::PrevSentence => {
            session.seek_to_sentence(session.current_index().saturating_sub(1))?;
            show_sentence(session);
        }
        ControlCommand::RateUp => {
            session.set_rate(session.rate() + RATE_STEP)?;
            show_status(session, &format!("rate {:.2}x", session.rate()));
        }
        ControlCommand::RateDown => {
            session.set_rate(session.rate() - RATE_STEP)?;
            show_status(session, &format!("rate {:.2}x", session.rate()));
        }
        ControlCommand::CycleVoice => {
            match next_voice_id(session.selected_voice(), session.available_voices()) {
                Some(voice_id) => {
                    session.set_voice(&voice_id)?;
                    show_status(session, &format!("voice {}", voice_id));
                }
                None => print_line("No voices reported yet."),
            }
        }
        ControlCommand::Stop => {
            session.stop()?;
            show_status(session, "stopped");
        }
        ControlCommand::Quit => return Ok(true),
    }
    Ok(false)
}

/// The voice after the selected one, wrapping around; the first voice when
/// nothing is selected or the selection vanished from the list.
fn next_voice_id(selected: Option<&VoiceInfo>, voices: &[VoiceInfo]) -> Option<String> {
    if voices.is_empty() {
        return None;
    }
    let next = match selected.and_then(|sel| voices.iter().position(|v| v.id == sel.id)) {
        Some(pos) => (pos + 1) % voices.len(),
        None => 0,
    };
    Some(voices[next].id.clone())
}

fn read_text(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file))
    }
}

fn show_sentence(session: &NarrationSession) {
    if let Some(sentence) = session.current_sentence() {
        print_line(&format!(
            "[{}/{}] {}",
            session.current_index() + 1,
            session.sentence_count(),
            sentence
        ));
    }
}

fn show_status(session: &NarrationSession, status: &str) {
    print_line(&format!(
        "[{}/{}] ({})",
        session.current_index() + 1,
        session.sentence_count(),
        status
    ));
}

/// Raw mode maps `\n` to a bare line feed, so lines carry their own `\r`.
fn print_line(message: &str) {
    print!("{}\r\n", message);
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("a", "A", "en", None),
            VoiceInfo::new("b", "B", "en", Some(VoiceGender::Female)),
            VoiceInfo::new("c", "C", "de", None),
        ]
    }

    #[test]
    fn cycles_through_voices_in_order() {
        let list = voices();
        assert_eq!(next_voice_id(None, &list).as_deref(), Some("a"));
        assert_eq!(next_voice_id(Some(&list[0]), &list).as_deref(), Some("b"));
        assert_eq!(next_voice_id(Some(&list[2]), &list).as_deref(), Some("a"));
    }

    #[test]
    fn no_voices_nothing_to_cycle() {
        assert_eq!(next_voice_id(None, &[]), None);
    }

    #[test]
    fn vanished_selection_starts_over() {
        let list = voices();
        let ghost = VoiceInfo::new("ghost", "G", "en", None);
        assert_eq!(next_voice_id(Some(&ghost), &list).as_deref(), Some("a"));
    }
}
