//! mkvmerge command options builder.
//!
//! Assembles the token list for the remux invocation: the original
//! container contributes every track it keeps, and each converted AC3
//! file is appended with the metadata inherited from its source track
//! (language, positive sync delay, name).

use std::path::Path;

use crate::config::Options;
use crate::models::{JobContext, TrackType};

/// Builder for the remux command tokens.
pub struct MkvmergeOptionsBuilder<'a> {
    ctx: &'a JobContext,
    opts: &'a Options,
    output_path: &'a Path,
}

impl<'a> MkvmergeOptionsBuilder<'a> {
    pub fn new(ctx: &'a JobContext, opts: &'a Options, output_path: &'a Path) -> Self {
        Self {
            ctx,
            opts,
            output_path,
        }
    }

    /// Build the complete mkvmerge token list.
    pub fn build(&self) -> Vec<String> {
        let mut tokens = vec!["-q".to_string()];

        // Appended files are numbered after the original (file 0), so
        // pinning 1..=n first puts every converted track at the head.
        if self.opts.initial {
            let order: Vec<String> = (1..=self.ctx.selected.len())
                .map(|file_idx| format!("{}:0", file_idx))
                .collect();
            tokens.push("--track-order".to_string());
            tokens.push(order.join(","));
        }

        tokens.push("-o".to_string());
        tokens.push(self.output_path.display().to_string());

        if self.opts.no_dts {
            self.add_audio_selection(&mut tokens);
        }

        tokens.push(self.ctx.source.display().to_string());

        let mut mark_default = self.opts.mark_default;
        for job in &self.ctx.selected {
            if mark_default {
                tokens.push("--default-track-flag".to_string());
                tokens.push("0:yes".to_string());
                mark_default = false;
            }

            tokens.push("--language".to_string());
            tokens.push(format!("0:{}", job.track.props.lang));

            if job.delay_ms > 0 {
                tokens.push("--sync".to_string());
                tokens.push(format!("0:{}", job.delay_ms));
            }

            let name = self
                .opts
                .custom_title
                .clone()
                .or_else(|| job.track.props.name.clone());
            if let Some(name) = name {
                tokens.push("--track-name".to_string());
                tokens.push(format!("0:{}", name));
            }

            tokens.push(job.ac3_path.display().to_string());
        }

        tokens
    }

    /// When the source DTS tracks are dropped, keep only the original
    /// audio tracks that were not converted; with none left, drop all
    /// audio from the original.
    fn add_audio_selection(&self, tokens: &mut Vec<String>) {
        let selected = self.ctx.selected_ids();
        let preserved: Vec<String> = self
            .ctx
            .tracks
            .iter()
            .filter(|t| t.track_type == TrackType::Audio && !selected.contains(&t.id))
            .map(|t| t.id.to_string())
            .collect();

        if preserved.is_empty() {
            tokens.push("-A".to_string());
        } else {
            tokens.push("-a".to_string());
            tokens.push(preserved.join(","));
        }
    }
}
