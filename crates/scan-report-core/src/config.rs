use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An RGB colour with components in the 0.0-1.0 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from 0-255 channel values.
    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self::new(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0)
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub const fn light_gray() -> Self {
        Self::new(0.9, 0.9, 0.9)
    }

    pub const fn dark_gray() -> Self {
        Self::new(0.35, 0.35, 0.35)
    }

    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 0.8)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::black()
    }
}

/// Colours used by the page builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    /// Headings, arc foreground and table headers
    #[serde(default = "default_brand")]
    pub brand: Rgb,
    /// Clickable link labels
    #[serde(default = "default_link")]
    pub link: Rgb,
    #[serde(default = "default_identical")]
    pub identical: Rgb,
    #[serde(default = "default_minor")]
    pub minor_changes: Rgb,
    #[serde(default = "default_paraphrased")]
    pub paraphrased: Rgb,
    #[serde(default = "default_omitted")]
    pub omitted: Rgb,
    #[serde(default = "default_ai")]
    pub ai: Rgb,
    #[serde(default = "default_human")]
    pub human: Rgb,
    /// Background behind AI-flagged words and ratio badges
    #[serde(default = "default_highlight")]
    pub highlight: Rgb,
}

fn default_brand() -> Rgb {
    Rgb::from_bytes(0x1f, 0x3a, 0x93)
}

fn default_link() -> Rgb {
    Rgb::blue()
}

fn default_identical() -> Rgb {
    Rgb::from_bytes(0xe5, 0x39, 0x35)
}

fn default_minor() -> Rgb {
    Rgb::from_bytes(0xfb, 0x8c, 0x00)
}

fn default_paraphrased() -> Rgb {
    Rgb::from_bytes(0xfd, 0xd8, 0x35)
}

fn default_omitted() -> Rgb {
    Rgb::from_bytes(0x9e, 0x9e, 0x9e)
}

fn default_ai() -> Rgb {
    Rgb::from_bytes(0x8e, 0x24, 0xaa)
}

fn default_human() -> Rgb {
    Rgb::from_bytes(0x43, 0xa0, 0x47)
}

fn default_highlight() -> Rgb {
    Rgb::from_bytes(0xff, 0xe0, 0x82)
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            link: default_link(),
            identical: default_identical(),
            minor_changes: default_minor(),
            paraphrased: default_paraphrased(),
            omitted: default_omitted(),
            ai: default_ai(),
            human: default_human(),
            highlight: default_highlight(),
        }
    }
}

/// A social icon in the page footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    /// Asset name of the icon image
    pub icon: String,
    /// Target URL of the clickable region
    pub url: String,
}

impl SocialLink {
    pub fn new(icon: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            url: url.into(),
        }
    }
}

fn default_social_links() -> Vec<SocialLink> {
    vec![
        SocialLink::new("facebook.png", "https://www.facebook.com/scanreport"),
        SocialLink::new("linkedin.png", "https://www.linkedin.com/company/scanreport"),
        SocialLink::new("twitter.png", "https://twitter.com/scanreport"),
        SocialLink::new("instagram.png", "https://www.instagram.com/scanreport"),
    ]
}

/// Names of the files read and written in the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub scan_results: String,
    pub ai_result: String,
    pub crawled_version: String,
    pub plagiarism_report: String,
    pub part1: String,
    pub header_added: String,
    pub plagiarism_merged: String,
    pub part2: String,
    pub final_report: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            scan_results: "scan_results.json".to_string(),
            ai_result: "ai_result.json".to_string(),
            crawled_version: "crawled_version.json".to_string(),
            plagiarism_report: "plagiarism_report.pdf".to_string(),
            part1: "part1.pdf".to_string(),
            header_added: "header_added.pdf".to_string(),
            plagiarism_merged: "plag.pdf".to_string(),
            part2: "part2.pdf".to_string(),
            final_report: "MergedFinalReport.pdf".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Input and output file names
    #[serde(default)]
    pub files: FileNames,

    /// Directory of the image assets (defaults to ./assets)
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Base URL encoded in the QR code, before `/user/scanreport/<id>`
    #[serde(default = "default_qr_base_url")]
    pub qr_base_url: String,

    /// Background drawn behind the QR code (None = transparent)
    #[serde(default = "default_qr_background")]
    pub qr_background: Option<Rgb>,

    /// Clickable target of the header band on annotated pages
    #[serde(default)]
    pub header_link: Option<String>,

    /// Text printed in every generated page footer
    #[serde(default = "default_footer_text")]
    pub footer_text: String,

    /// Target of the "Learn more" links in explanatory blocks
    #[serde(default = "default_learn_more_url")]
    pub learn_more_url: String,

    /// Social icons in the footer
    #[serde(default = "default_social_links")]
    pub social_links: Vec<SocialLink>,

    /// Colours used by the page builders
    #[serde(default)]
    pub palette: Palette,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_qr_base_url() -> String {
    "https://app.scanreport.io".to_string()
}

#[allow(clippy::unnecessary_wraps)] // serde default must match the field type
const fn default_qr_background() -> Option<Rgb> {
    Some(Rgb::white())
}

fn default_footer_text() -> String {
    "This report was generated automatically. Results are indicative and should be reviewed by a person.".to_string()
}

fn default_learn_more_url() -> String {
    "https://www.scanreport.io/help".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            files: FileNames::default(),
            assets_dir: default_assets_dir(),
            qr_base_url: default_qr_base_url(),
            qr_background: default_qr_background(),
            header_link: None,
            footer_text: default_footer_text(),
            learn_more_url: default_learn_more_url(),
            social_links: default_social_links(),
            palette: Palette::default(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, crate::error::Error> {
        toml::from_str(content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })
    }

    /// Load from default locations (~/.config/scan-report/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("scan-report").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// URL encoded in the QR code for a scan.
    pub fn qr_url(&self, identifier: &str) -> String {
        format!(
            "{}/user/scanreport/{}",
            self.qr_base_url.trim_end_matches('/'),
            identifier
        )
    }
}
