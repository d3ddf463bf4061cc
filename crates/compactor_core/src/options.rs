use serde::{Deserialize, Serialize};

/// Quality preset sent with the upload; the server maps it to an encoder setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Quality {
    High,
    #[default]
    Balanced,
    Small,
    Xs,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::High, Quality::Balanced, Quality::Small, Quality::Xs];

    pub fn as_form_value(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Balanced => "balanced",
            Quality::Small => "small",
            Quality::Xs => "xs",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_form_value().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Codec {
    #[default]
    H265,
    H264,
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::H265, Codec::H264];

    pub fn as_form_value(self) -> &'static str {
        match self {
            Codec::H265 => "h265",
            Codec::H264 => "h264",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_form_value().eq_ignore_ascii_case(value.trim()))
    }
}

/// Target resolution; `Original` keeps the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Resolution {
    #[default]
    Original,
    P720,
    P480,
    P360,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Original,
        Resolution::P720,
        Resolution::P480,
        Resolution::P360,
    ];

    pub fn as_form_value(self) -> &'static str {
        match self {
            Resolution::Original => "original",
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
            Resolution::P360 => "360p",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_form_value().eq_ignore_ascii_case(value.trim()))
    }
}

macro_rules! form_value_serde {
    ($($ty:ident => $what:literal),* $(,)?) => {$(
        impl From<$ty> for &'static str {
            fn from(value: $ty) -> Self {
                value.as_form_value()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $ty::from_form_value(&value)
                    .ok_or_else(|| format!(concat!("unknown ", $what, " '{}'"), value))
            }
        }
    )*};
}

form_value_serde!(Quality => "quality", Codec => "codec", Resolution => "resolution");

/// Form fields submitted next to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressOptions {
    pub quality: Quality,
    pub codec: Codec,
    pub resolution: Resolution,
}

impl CompressOptions {
    /// Multipart field names and values, in form order.
    pub fn form_fields(&self) -> [(&'static str, &'static str); 3] {
        [
            ("quality", self.quality.as_form_value()),
            ("codec", self.codec.as_form_value()),
            ("resolution", self.resolution.as_form_value()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_values_parse_case_insensitively() {
        assert_eq!(Quality::from_form_value(" XS "), Some(Quality::Xs));
        assert_eq!(Codec::from_form_value("H264"), Some(Codec::H264));
        assert_eq!(Resolution::from_form_value("480P"), Some(Resolution::P480));
        assert_eq!(Quality::from_form_value("ultra"), None);
    }

    #[test]
    fn serde_uses_form_values() {
        assert_eq!(serde_json::to_string(&Resolution::P720).unwrap(), "\"720p\"");
        assert_eq!(
            serde_json::from_str::<Quality>("\"Small\"").unwrap(),
            Quality::Small
        );
        let err = serde_json::from_str::<Codec>("\"vp9\"").unwrap_err();
        assert!(err.to_string().contains("unknown codec 'vp9'"));
    }

    #[test]
    fn default_fields_match_the_form_defaults() {
        assert_eq!(
            CompressOptions::default().form_fields(),
            [
                ("quality", "balanced"),
                ("codec", "h265"),
                ("resolution", "original")
            ]
        );
    }
}
