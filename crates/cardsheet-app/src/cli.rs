// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use cardsheet_core::types::{ExportOptions, Orientation, PaperSize};
use clap::{Parser, Subcommand};

use crate::services::output::OutputFormat;

/// Print-accurate 3x3 card sheets.
#[derive(Parser, Debug)]
#[command(name = "cardsheet")]
#[command(version)]
#[command(about = "Render 3x3 card sheets to print-ready PDF or PNG", long_about = None)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/cardsheet/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a layout file
    Render(RenderArgs),
    /// Check whether the enhancement service answers
    Probe,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Layout JSON file
    #[arg(long)]
    pub layout: PathBuf,

    /// Output file; PNG output writes `<stem>-<n>.png` per page
    #[arg(long)]
    pub out: PathBuf,

    /// Output format (default: from the output extension, else pdf)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(long)]
    pub dpi: Option<u32>,

    /// a4 or letter
    #[arg(long)]
    pub paper: Option<PaperSize>,

    #[arg(long)]
    pub landscape: bool,

    /// Bleed per card edge in mm
    #[arg(long)]
    pub bleed: Option<f64>,

    /// Advisory page margin in mm
    #[arg(long)]
    pub margin: Option<f64>,

    /// Horizontal alignment nudge in mm
    #[arg(long, allow_negative_numbers = true)]
    pub offset_x: Option<f64>,

    /// Vertical alignment nudge in mm
    #[arg(long, allow_negative_numbers = true)]
    pub offset_y: Option<f64>,

    /// Print scale compensation, clamped to 0.95..=1.10
    #[arg(long)]
    pub scale: Option<f64>,

    /// Draw cut guides
    #[arg(long, conflicts_with = "no_cut_guides")]
    pub cut_guides: bool,

    /// Skip cut guides
    #[arg(long)]
    pub no_cut_guides: bool,

    /// Annotate each slot with its physical size
    #[arg(long)]
    pub debug_sizes: bool,

    /// Upscale card images with the local enhancement service
    #[arg(long)]
    pub upscale: bool,
}

impl RenderArgs {
    /// Apply the flags that were given on top of `base`.
    pub fn apply_to(&self, base: &ExportOptions) -> ExportOptions {
        let mut opts = base.clone();
        if let Some(dpi) = self.dpi {
            opts.dpi = dpi;
        }
        if let Some(paper) = self.paper {
            opts.paper = paper;
        }
        if self.landscape {
            opts.orientation = Orientation::Landscape;
        }
        if let Some(bleed) = self.bleed {
            opts.bleed_mm = bleed;
        }
        if let Some(margin) = self.margin {
            opts.margin_mm = margin;
        }
        if let Some(x) = self.offset_x {
            opts.alignment_offset_x_mm = x;
        }
        if let Some(y) = self.offset_y {
            opts.alignment_offset_y_mm = y;
        }
        if self.scale.is_some() {
            opts.print_scale_compensation = self.scale;
        }
        if self.cut_guides {
            opts.draw_cut_margins = true;
        }
        if self.no_cut_guides {
            opts.draw_cut_margins = false;
        }
        opts.debug_slot_sizes |= self.debug_sizes;
        opts.upscale_enabled |= self.upscale;
        opts
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_path(&self.out))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RenderArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Render(args) => args,
            Commands::Probe => panic!("expected render"),
        }
    }

    #[test]
    fn flags_override_config_defaults() {
        let args = parse(&[
            "cardsheet", "render", "--layout", "l.json", "--out", "o.pdf", "--dpi", "600",
            "--paper", "letter", "--landscape", "--bleed", "1.5", "--offset-x", "-0.4",
            "--scale", "1.02", "--no-cut-guides", "--upscale",
        ]);
        let opts = args.apply_to(&ExportOptions::default());
        assert_eq!(opts.dpi, 600);
        assert_eq!(opts.paper, PaperSize::Letter);
        assert_eq!(opts.orientation, Orientation::Landscape);
        assert_eq!(opts.bleed_mm, 1.5);
        assert_eq!(opts.alignment_offset_x_mm, -0.4);
        assert_eq!(opts.print_scale_compensation, Some(1.02));
        assert!(!opts.draw_cut_margins);
        assert!(opts.upscale_enabled);
        assert!(!opts.debug_slot_sizes);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let base = ExportOptions {
            dpi: 450,
            margin_mm: 7.0,
            draw_cut_margins: false,
            ..Default::default()
        };
        let opts = parse(&["cardsheet", "render", "--layout", "l.json", "--out", "o.pdf"]).apply_to(&base);
        assert_eq!(opts, base);
    }

    #[test]
    fn format_follows_extension_unless_given() {
        let png = parse(&["cardsheet", "render", "--layout", "l", "--out", "deck.png"]);
        assert_eq!(png.output_format(), OutputFormat::Png);
        let forced = parse(&[
            "cardsheet", "render", "--layout", "l", "--out", "deck.png", "--format", "pdf",
        ]);
        assert_eq!(forced.output_format(), OutputFormat::Pdf);
        let bare = parse(&["cardsheet", "render", "--layout", "l", "--out", "deck"]);
        assert_eq!(bare.output_format(), OutputFormat::Pdf);
    }

    #[test]
    fn unknown_paper_is_rejected() {
        assert!(
            Cli::try_parse_from(["cardsheet", "render", "--layout", "l", "--out", "o", "--paper", "a3"])
                .is_err()
        );
    }

    #[test]
    fn probe_accepts_global_config() {
        let cli = Cli::try_parse_from(["cardsheet", "probe", "--config", "/tmp/c.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Probe));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }
}
