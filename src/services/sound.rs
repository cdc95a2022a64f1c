//! Warning and completion cues played through the default audio output

use std::{fs::File, io::BufReader, path::PathBuf};
use anyhow::Context;
use rodio::{Decoder, OutputStream, Sink};
use tracing::{debug, warn};

use crate::timer::{Cue, SoundTrigger};

/// Plays cue files on a detached thread per cue
#[derive(Debug, Clone)]
pub struct SoundPlayer {
    warning: PathBuf,
    completion: PathBuf,
    volume: u8,
}

impl SoundPlayer {
    pub fn new(warning: PathBuf, completion: PathBuf, volume: u8) -> Self {
        Self {
            warning,
            completion,
            volume: volume.min(100),
        }
    }

    pub fn file_for(&self, cue: Cue) -> &PathBuf {
        match cue {
            Cue::Warning => &self.warning,
            Cue::Completion => &self.completion,
        }
    }
}

impl SoundTrigger for SoundPlayer {
    /// Open the cue file and hand it to a playback thread.
    ///
    /// A missing file is reported to the caller; a missing audio device or an
    /// undecodable file is only logged from the playback thread.
    fn play(&self, cue: Cue) -> anyhow::Result<()> {
        let path = self.file_for(cue).clone();
        let file = File::open(&path)
            .with_context(|| format!("failed to open cue file {}", path.display()))?;
        let volume = self.volume;
        debug!("Playing {:?} cue from {}", cue, path.display());

        std::thread::spawn(move || {
            let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                warn!("No audio output device, {:?} cue skipped", cue);
                return;
            };
            let source = match Decoder::new(BufReader::new(file)) {
                Ok(source) => source,
                Err(e) => {
                    warn!("Failed to decode {}: {}", path.display(), e);
                    return;
                }
            };
            let sink = match Sink::try_new(&stream_handle) {
                Ok(sink) => sink,
                Err(e) => {
                    warn!("Failed to open audio sink: {}", e);
                    return;
                }
            };

            sink.set_volume(volume as f32 / 100.0);
            sink.append(source);
            sink.sleep_until_end();
        });

        Ok(())
    }
}
