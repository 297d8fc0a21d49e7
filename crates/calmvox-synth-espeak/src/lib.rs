//! espeak-ng playback engine for CalmVox
//!
//! Spawns one espeak process per utterance and plays through the system
//! audio device. Pause and resume map to SIGSTOP/SIGCONT on the child;
//! cancel maps to SIGKILL, which also terminates a stopped process. A
//! monitor thread reaps each child and reports the outcome on the engine's
//! event channel.

use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use calmvox_synth::{
    EventSender, SynthesisEngine, SynthesisError, SynthesisEvent, SynthesisResult, Utterance,
    UtteranceId, VoiceGender, VoiceInfo,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, warn};

#[cfg(unix)]
use nix::sys::signal::Signal;

mod tests;

/// espeak's default speaking rate in words per minute.
const BASE_WPM: f32 = 175.0;
/// Bounds espeak accepts for the `-s` flag.
const MIN_WPM: u32 = 80;
const MAX_WPM: u32 = 450;

static VOICE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s+([\w-]+)\s+([\w/+-]+)\s+(\S+)\s+(\S+)").expect("espeak voice line regex")
});

struct ActiveUtterance {
    id: UtteranceId,
    pid: u32,
    cancelled: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

impl ActiveUtterance {
    /// True once the monitor has waited on the child. The OS may recycle a
    /// waited-on pid at any time, so it must never be signalled again.
    fn reaped(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }
}

pub struct EspeakEngine {
    command: String,
    voices: Arc<Mutex<Vec<VoiceInfo>>>,
    events: EventSender,
    current: Option<ActiveUtterance>,
}

impl EspeakEngine {
    /// Locate espeak and start asynchronous voice discovery.
    ///
    /// Fails only when neither `espeak-ng` nor `espeak` is on the PATH.
    /// Voice discovery runs in a background thread and announces itself
    /// with a `VoicesChanged` event on `events`.
    pub fn spawn(events: EventSender) -> SynthesisResult<Self> {
        let command = detect_command().ok_or_else(|| {
            SynthesisError::EngineNotAvailable(
                "espeak not found. Please install espeak-ng or espeak.".to_string(),
            )
        })?;
        debug!("Using '{}' for speech synthesis", command);

        let engine = Self {
            command: command.clone(),
            voices: Arc::new(Mutex::new(Vec::new())),
            events: events.clone(),
            current: None,
        };

        let shared = Arc::clone(&engine.voices);
        thread::spawn(
            move || match Command::new(&command).arg("--voices").output() {
                Ok(output) => {
                    let parsed = parse_voice_table(&String::from_utf8_lossy(&output.stdout));
                    debug!("Loaded {} espeak voices", parsed.len());
                    *shared.lock().unwrap() = parsed.clone();
                    let _ = events.send(SynthesisEvent::VoicesChanged(parsed));
                }
                Err(e) => warn!("Failed to load espeak voices: {}", e),
            },
        );

        Ok(engine)
    }

    /// Forget the tracked utterance, killing its child if it still runs.
    ///
    /// The monitor thread never touches `current`, so a naturally finished
    /// utterance stays tracked here until the next submission reaps it. By
    /// then its child has been waited on, so the kill is skipped; the pid
    /// could already belong to some unrelated process.
    fn reap_current(&mut self) {
        if let Some(stale) = self.current.take() {
            if stale.reaped() {
                return;
            }
            stale.cancelled.store(true, Ordering::SeqCst);
            if let Err(e) = kill_process(stale.pid) {
                warn!("Failed to reap espeak pid {}: {}", stale.pid, e);
            }
        }
    }
}

impl SynthesisEngine for EspeakEngine {
    fn name(&self) -> &str {
        &self.command
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.lock().unwrap().clone()
    }

    fn speak(&mut self, utterance: Utterance) -> SynthesisResult<()> {
        if utterance.text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput(
                "empty utterance text".to_string(),
            ));
        }

        self.reap_current();

        let args = build_args(&utterance);
        debug!("Running {} {:?}", self.command, args);
        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let pid = child.id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let exited = Arc::new(AtomicBool::new(false));
        self.current = Some(ActiveUtterance {
            id: utterance.id,
            pid,
            cancelled: Arc::clone(&cancelled),
            exited: Arc::clone(&exited),
        });

        let events = self.events.clone();
        let utterance_id = utterance.id;
        thread::spawn(move || {
            let outcome = child.wait_with_output();
            if outcome.is_ok() {
                // The child is reaped; its pid is no longer safe to signal.
                exited.store(true, Ordering::SeqCst);
            }
            let event = match outcome {
                Ok(_) if cancelled.load(Ordering::SeqCst) => {
                    debug!("Utterance {} cancelled", utterance_id);
                    SynthesisEvent::Cancelled { utterance_id }
                }
                Ok(output) if output.status.success() => {
                    SynthesisEvent::Finished { utterance_id }
                }
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let trimmed = stderr.trim();
                    let error = if trimmed.is_empty() {
                        format!("espeak exited with {}", output.status)
                    } else {
                        format!("espeak exited with {}: {}", output.status, trimmed)
                    };
                    error!("Utterance {} failed: {}", utterance_id, error);
                    SynthesisEvent::Failed {
                        utterance_id,
                        error,
                    }
                }
                Err(e) => {
                    error!("Failed to reap espeak process: {}", e);
                    SynthesisEvent::Failed {
                        utterance_id,
                        error: format!("process wait failed: {}", e),
                    }
                }
            };
            let _ = events.send(event);
        });

        Ok(())
    }

    fn pause(&mut self) -> SynthesisResult<()> {
        if let Some(active) = &self.current {
            if active.reaped() {
                return Ok(());
            }
            debug!("Pausing utterance {} (pid {})", active.id, active.pid);
            suspend_process(active.pid)?;
        }
        Ok(())
    }

    fn resume(&mut self) -> SynthesisResult<()> {
        if let Some(active) = &self.current {
            if active.reaped() {
                return Ok(());
            }
            debug!("Resuming utterance {} (pid {})", active.id, active.pid);
            continue_process(active.pid)?;
        }
        Ok(())
    }

    fn cancel(&mut self) -> SynthesisResult<()> {
        if let Some(active) = self.current.take() {
            if active.reaped() {
                debug!("Utterance {} already exited; nothing to cancel", active.id);
                return Ok(());
            }
            debug!("Cancelling utterance {} (pid {})", active.id, active.pid);
            active.cancelled.store(true, Ordering::SeqCst);
            kill_process(active.pid)?;
        }
        Ok(())
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            warn!("espeak cancel during teardown failed: {}", e);
        }
    }
}

/// Find the espeak binary, preferring the maintained espeak-ng.
fn detect_command() -> Option<String> {
    for candidate in ["espeak-ng", "espeak"] {
        if Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
        {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Map utterance parameters onto espeak command-line flags.
///
/// The rate multiplier scales espeak's default words-per-minute; pitch maps
/// onto espeak's 0-99 scale and volume onto amplitude, where 100 is normal
/// loudness. `--` guards against sentence text starting with a dash.
fn build_args(utterance: &Utterance) -> Vec<String> {
    let params = &utterance.params;
    let mut args = Vec::new();

    if let Some(voice_id) = &params.voice_id {
        args.push("-v".to_string());
        args.push(voice_id.clone());
    }

    let wpm = ((BASE_WPM * params.rate) as u32).clamp(MIN_WPM, MAX_WPM);
    args.push("-s".to_string());
    args.push(wpm.to_string());

    let pitch = ((params.pitch * 50.0) as u32).min(99);
    args.push("-p".to_string());
    args.push(pitch.to_string());

    let amplitude = ((params.volume * 100.0) as u32).min(200);
    args.push("-a".to_string());
    args.push(amplitude.to_string());

    args.push("--".to_string());
    args.push(utterance.text.clone());

    args
}

/// Parse `espeak --voices` output.
///
/// Handles both the espeak-ng table (`5  en-gb  --/M  English_(Great_Britain)  gmw/en-GB`)
/// and the legacy espeak table (`2  en-gb  M  english  en`).
fn parse_voice_table(output: &str) -> Vec<VoiceInfo> {
    let mut voices = Vec::new();

    for line in output.lines().skip(1) {
        if let Some(captures) = VOICE_LINE.captures(line) {
            let language = captures.get(1).map_or("", |m| m.as_str()).to_string();
            let age_gender = captures.get(2).map_or("", |m| m.as_str());
            let name_raw = captures.get(3).map_or("", |m| m.as_str());
            let file = captures.get(4).map_or("", |m| m.as_str());

            let gender = if age_gender.contains('F') {
                Some(VoiceGender::Female)
            } else if age_gender.contains('M') {
                Some(VoiceGender::Male)
            } else {
                Some(VoiceGender::Unknown)
            };

            let mut properties = HashMap::new();
            properties.insert("file".to_string(), file.to_string());

            voices.push(VoiceInfo {
                id: name_raw.to_string(),
                name: name_raw.replace('_', " "),
                language,
                gender,
                properties,
            });
        }
    }

    voices
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> SynthesisResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => Ok(()),
        // The process already exited; the race resolves via its event.
        Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(SynthesisError::Synthesis(format!(
            "{:?} to espeak pid {} failed: {}",
            signal, pid, e
        ))),
    }
}

#[cfg(unix)]
fn suspend_process(pid: u32) -> SynthesisResult<()> {
    send_signal(pid, Signal::SIGSTOP)
}

#[cfg(unix)]
fn continue_process(pid: u32) -> SynthesisResult<()> {
    send_signal(pid, Signal::SIGCONT)
}

#[cfg(unix)]
fn kill_process(pid: u32) -> SynthesisResult<()> {
    // SIGKILL also terminates a SIGSTOPped process, unlike SIGTERM.
    send_signal(pid, Signal::SIGKILL)
}

#[cfg(not(unix))]
fn suspend_process(_pid: u32) -> SynthesisResult<()> {
    Err(SynthesisError::Unsupported(
        "pause requires unix process signals".to_string(),
    ))
}

#[cfg(not(unix))]
fn continue_process(_pid: u32) -> SynthesisResult<()> {
    Err(SynthesisError::Unsupported(
        "resume requires unix process signals".to_string(),
    ))
}

#[cfg(not(unix))]
fn kill_process(_pid: u32) -> SynthesisResult<()> {
    Err(SynthesisError::Unsupported(
        "cancel requires unix process signals".to_string(),
    ))
}
