//! Command-line interface.
//!
//! ```text
//! gridded [-r ROWS] [-c COLS] [-f] [-m] [-p WIN | -w WIN] [--config PATH] -- CMD...
//! ```
//!
//! Every argument after `--` (or after the first non-flag argument) is one
//! shell command line, run as its own process.

use crate::config::LayoutConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gridded", version, about = "Tile child windows in a grid")]
pub struct Cli {
    /// Number of rows (0 = as many as needed)
    #[arg(short, long)]
    pub rows: Option<u32>,

    /// Number of columns (0 = as many as needed)
    #[arg(short, long)]
    pub cols: Option<u32>,

    /// Start in full mode
    #[arg(short, long)]
    pub full: bool,

    /// Mirror the slot order once after spawning
    #[arg(short, long)]
    pub mirror: bool,

    /// Use an existing window as the container instead of creating one
    #[arg(short, long, value_parser = parse_window_id, conflicts_with = "embed")]
    pub parent: Option<u32>,

    /// Create the container inside this window
    #[arg(short = 'w', long, value_parser = parse_window_id)]
    pub embed: Option<u32>,

    /// Config file (default: $XDG_CONFIG_HOME/gridded/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Commands to run, one process each
    #[arg(trailing_var_arg = true)]
    pub commands: Vec<String>,
}

impl Cli {
    /// Overlay the flags given on the command line onto `layout`.
    pub fn apply(&self, mut layout: LayoutConfig) -> LayoutConfig {
        if let Some(rows) = self.rows {
            layout.rows = rows;
        }
        if let Some(cols) = self.cols {
            layout.cols = cols;
        }
        layout.full |= self.full;
        layout.mirror |= self.mirror;
        layout
    }
}

/// Parse a window id in decimal or `0x` hexadecimal.
pub fn parse_window_id(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid window id {:?}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gridded").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn short_flags_with_attached_and_separate_values() {
        let cli = parse(&["-r2", "-c", "3", "-f", "-m", "--", "xterm", "st -e top"]);
        assert_eq!(cli.rows, Some(2));
        assert_eq!(cli.cols, Some(3));
        assert!(cli.full);
        assert!(cli.mirror);
        assert_eq!(cli.commands, vec!["xterm", "st -e top"]);
    }

    #[test]
    fn commands_after_terminator_keep_their_dashes() {
        let cli = parse(&["-c2", "--", "xterm -e htop", "-not-a-flag"]);
        assert_eq!(cli.commands, vec!["xterm -e htop", "-not-a-flag"]);
    }

    #[test]
    fn first_positional_starts_command_list() {
        let cli = parse(&["-c", "2", "xterm", "-f"]);
        assert_eq!(cli.commands, vec!["xterm", "-f"]);
        assert!(!cli.full, "flags after the first command belong to the command list");
    }

    #[test]
    fn window_ids_accept_hex() {
        let cli = parse(&["-p", "0x2a00003"]);
        assert_eq!(cli.parent, Some(0x2a00003));
        let cli = parse(&["-w", "12345"]);
        assert_eq!(cli.embed, Some(12345));
        assert!(parse_window_id("zz").is_err());
    }

    #[test]
    fn parent_and_embed_conflict() {
        assert!(Cli::try_parse_from(["gridded", "-p", "1", "-w", "2"]).is_err());
    }

    #[test]
    fn flags_override_config_layout() {
        let base = LayoutConfig {
            rows: 1,
            cols: 4,
            full: false,
            mirror: false,
        };
        let merged = parse(&["-c", "2", "-f"]).apply(base);
        assert_eq!(merged.rows, 1);
        assert_eq!(merged.cols, 2);
        assert!(merged.full);
        assert!(!merged.mirror);
    }
}
