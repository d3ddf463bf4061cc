use std::path::PathBuf;

use clap::Parser;
use compactor_core::{Codec, Quality, Resolution};

#[derive(Debug, Parser)]
#[command(
    name = "compactor",
    version,
    about = "Upload a file for compression, follow its progress and download the result"
)]
pub struct Cli {
    /// File to compress
    #[arg(value_name = "FILE", required_unless_present = "init_config")]
    pub file: Option<PathBuf>,
    /// Base url of the compression server
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,
    /// high, balanced, small or xs
    #[arg(long, value_parser = parse_quality)]
    pub quality: Option<Quality>,
    /// h265 or h264
    #[arg(long, value_parser = parse_codec)]
    pub codec: Option<Codec>,
    /// original, 720p, 480p or 360p
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,
    /// Directory the compressed file is saved into
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Config file (defaults to ./compactor.ron when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    pub init_config: bool,
    /// Debug logging, also echoed to the terminal
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_quality(value: &str) -> Result<Quality, String> {
    Quality::from_form_value(value).ok_or_else(|| format!("unknown quality '{value}'"))
}

fn parse_codec(value: &str) -> Result<Codec, String> {
    Codec::from_form_value(value).ok_or_else(|| format!("unknown codec '{value}'"))
}

fn parse_resolution(value: &str) -> Result<Resolution, String> {
    Resolution::from_form_value(value).ok_or_else(|| format!("unknown resolution '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_and_options() {
        let cli = Cli::try_parse_from([
            "compactor",
            "clip.mp4",
            "--quality",
            "xs",
            "--codec",
            "h264",
            "--resolution",
            "720p",
            "--server",
            "http://media.local:8080",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("clip.mp4")));
        assert_eq!(cli.quality, Some(Quality::Xs));
        assert_eq!(cli.codec, Some(Codec::H264));
        assert_eq!(cli.resolution, Some(Resolution::P720));
        assert_eq!(cli.server.as_deref(), Some("http://media.local:8080"));
    }

    #[test]
    fn file_is_required_unless_writing_config() {
        assert!(Cli::try_parse_from(["compactor"]).is_err());
        let cli = Cli::try_parse_from(["compactor", "--init-config"]).unwrap();
        assert!(cli.init_config);
        assert_eq!(cli.file, None);
    }

    #[test]
    fn rejects_unknown_option_values() {
        assert!(Cli::try_parse_from(["compactor", "a.mp4", "--codec", "vp9"]).is_err());
    }
}
