//! Tests for espeak argument mapping and voice table parsing

#[cfg(test)]
mod tests {
    use crate::{build_args, detect_command, parse_voice_table, EspeakEngine};
    use calmvox_synth::{
        SynthesisEngine, SynthesisError, Utterance, UtteranceParams, VoiceGender,
    };

    #[cfg(unix)]
    use crate::ActiveUtterance;
    #[cfg(unix)]
    use calmvox_synth::UtteranceId;
    #[cfg(unix)]
    use std::sync::atomic::{AtomicBool, Ordering};
    #[cfg(unix)]
    use std::sync::{Arc, Mutex};

    const ESPEAK_NG_VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-gb           --/M      English_(Great_Britain) gmw/en-GB      (en 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  vi-vn-x-central --/F      Vietnamese_(Central) aav/vi-VN-x-central
";

    const LEGACY_VOICES: &str = "\
Pty Language Age/Gender VoiceName      File        Other Languages
 2  af             M  afrikaans            af
 2  en-gb          M  english              en            (en 2)
 2  en-gb          F  english_female       en-f
";

    fn has_flag(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[cfg(unix)]
    fn stub_engine() -> EspeakEngine {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        EspeakEngine {
            command: "espeak-ng".to_string(),
            voices: Arc::new(Mutex::new(Vec::new())),
            events: tx,
            current: None,
        }
    }

    /// Pid of a child that has already been waited on, so signalling it
    /// would target a slot the OS is free to reuse.
    #[cfg(unix)]
    fn expired_pid() -> u32 {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("spawn true");
        let pid = child.id();
        child.wait().expect("wait for true");
        pid
    }

    #[cfg(unix)]
    fn tracked(pid: u32, exited: bool) -> (ActiveUtterance, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let utterance = ActiveUtterance {
            id: UtteranceId(7),
            pid,
            cancelled: Arc::clone(&cancelled),
            exited: Arc::new(AtomicBool::new(exited)),
        };
        (utterance, cancelled)
    }

    #[test]
    fn test_parse_espeak_ng_voice_table() {
        let voices = parse_voice_table(ESPEAK_NG_VOICES);
        assert_eq!(voices.len(), 4);

        let gb = &voices[1];
        assert_eq!(gb.id, "English_(Great_Britain)");
        assert_eq!(gb.name, "English (Great Britain)");
        assert_eq!(gb.language, "en-gb");
        assert_eq!(gb.gender, Some(VoiceGender::Male));
        assert_eq!(gb.properties.get("file").map(String::as_str), Some("gmw/en-GB"));

        let vi = &voices[3];
        assert_eq!(vi.language, "vi-vn-x-central");
        assert_eq!(vi.gender, Some(VoiceGender::Female));
    }

    #[test]
    fn test_parse_legacy_voice_table() {
        let voices = parse_voice_table(LEGACY_VOICES);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].id, "english");
        assert_eq!(voices[1].gender, Some(VoiceGender::Male));
        assert_eq!(voices[2].id, "english_female");
        assert_eq!(voices[2].gender, Some(VoiceGender::Female));
    }

    #[test]
    fn test_parse_voice_table_ignores_garbage() {
        assert!(parse_voice_table("").is_empty());
        assert!(parse_voice_table("no table here\njust noise\n").is_empty());
    }

    #[test]
    fn test_build_args_maps_params() {
        let utterance = Utterance::new(
            "Calm waters",
            UtteranceParams {
                voice_id: Some("en-gb".to_string()),
                rate: 2.0,
                pitch: 1.0,
                volume: 1.0,
            },
        );
        let args = build_args(&utterance);
        assert_eq!(
            args,
            vec!["-v", "en-gb", "-s", "350", "-p", "50", "-a", "100", "--", "Calm waters"]
        );
    }

    #[test]
    fn test_build_args_omits_voice_when_unset() {
        let utterance = Utterance::new("hello", UtteranceParams::default());
        let args = build_args(&utterance);
        assert!(!args.contains(&"-v".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_build_args_clamps_wpm() {
        let slow = Utterance::new(
            "x",
            UtteranceParams {
                rate: 0.25,
                ..UtteranceParams::default()
            },
        );
        let fast = Utterance::new(
            "x",
            UtteranceParams {
                rate: 4.0,
                ..UtteranceParams::default()
            },
        );
        assert!(has_flag(&build_args(&slow), "-s", "80"));
        assert!(has_flag(&build_args(&fast), "-s", "450"));
    }

    #[test]
    fn test_build_args_clamps_pitch_and_amplitude() {
        let shrill = Utterance::new(
            "x",
            UtteranceParams {
                pitch: 2.5,
                volume: 2.5,
                ..UtteranceParams::default()
            },
        );
        let args = build_args(&shrill);
        assert!(has_flag(&args, "-p", "99"));
        assert!(has_flag(&args, "-a", "200"));
    }

    #[test]
    fn test_detect_command_does_not_panic() {
        // The test environment may or may not have espeak installed; just
        // ensure detection itself is well-behaved.
        let _ = detect_command();
    }

    #[test]
    fn test_spawn_reports_missing_binary_cleanly() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        match EspeakEngine::spawn(tx) {
            Ok(engine) => assert!(!engine.name().is_empty()),
            Err(e) => assert!(matches!(e, SynthesisError::EngineNotAvailable(_))),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_reap_skips_child_the_monitor_waited_on() {
        let mut engine = stub_engine();
        let (utterance, cancelled) = tracked(expired_pid(), true);
        engine.current = Some(utterance);

        engine.reap_current();

        assert!(engine.current.is_none());
        assert!(
            !cancelled.load(Ordering::SeqCst),
            "a waited-on pid must not be signalled"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_reap_still_kills_unwaited_children() {
        let mut engine = stub_engine();
        let (utterance, cancelled) = tracked(expired_pid(), false);
        engine.current = Some(utterance);

        engine.reap_current();

        assert!(engine.current.is_none());
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_skips_child_the_monitor_waited_on() {
        let mut engine = stub_engine();
        let (utterance, cancelled) = tracked(expired_pid(), true);
        engine.current = Some(utterance);

        engine.cancel().unwrap();

        assert!(engine.current.is_none());
        assert!(!cancelled.load(Ordering::SeqCst));
    }
}
