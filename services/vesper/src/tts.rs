use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use vesper_core::{Speech, SpeechGate};

/// Speech engine backed by the platform's text-to-speech command.
///
/// `say` only queues the line; a dedicated worker thread runs the subprocess
/// so playback never blocks the resolver. The worker consults the gate
/// before each line (a line queued just before mute is dropped, not held)
/// and flips the `speaking` flag around playback for status snapshots.
pub struct TtsSpeech {
    tx: mpsc::Sender<String>,
}

impl TtsSpeech {
    pub fn new(gate: Arc<SpeechGate>) -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            while let Ok(line) = rx.recv() {
                if !gate.is_audible() {
                    tracing::debug!(line = %line, "speech gate closed, dropping line");
                    continue;
                }
                gate.speaking.store(true, Ordering::Relaxed);
                if let Err(e) = speak_blocking(&line) {
                    tracing::warn!(error = %e, "text-to-speech failed");
                }
                gate.speaking.store(false, Ordering::Relaxed);
            }
        });
        Self { tx }
    }
}

impl Speech for TtsSpeech {
    fn say(&self, text: &str) {
        tracing::info!(line = %text, "speaking");
        if self.tx.send(text.to_string()).is_err() {
            tracing::warn!("speech worker is gone, dropping line");
        }
    }
}

#[cfg(target_os = "macos")]
fn speak_blocking(line: &str) -> Result<()> {
    run_tts("say", &[line])
}

#[cfg(target_os = "linux")]
fn speak_blocking(line: &str) -> Result<()> {
    run_tts("espeak", &[line])
}

#[cfg(target_os = "windows")]
fn speak_blocking(line: &str) -> Result<()> {
    let script = format!(
        "Add-Type -AssemblyName System.Speech; \
         (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{}')",
        line.replace('\'', "''")
    );
    run_tts("powershell", &["-NoProfile", "-Command", &script])
}

fn run_tts(program: &str, args: &[&str]) -> Result<()> {
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to run {program}"))?;
    if !status.success() {
        anyhow::bail!("{program} exited with {status}");
    }
    Ok(())
}
