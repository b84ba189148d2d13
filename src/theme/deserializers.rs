use gpui::{Pixels, SharedString, px};
use serde::{Deserialize, Deserializer, de::Error};
use smallvec::SmallVec;

pub fn de_string_or_non_empty_list<'de, D>(
    deserializer: D,
) -> Result<SmallVec<[SharedString; 1]>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        One(SharedString),
        Many(SmallVec<[SharedString; 1]>),
    }

    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::One(string) => Ok(SmallVec::from_buf([string])),
        StringOrVec::Many(vec) => {
            if vec.is_empty() {
                return Err(D::Error::custom("font family list can't be empty."));
            }

            Ok(vec)
        }
    }
}

pub fn de_pixels<'de, D>(deserializer: D) -> Result<Pixels, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrFloat::deserialize(deserializer)? {
        StringOrFloat::String(string) => {
            let Some(string) = string.strip_suffix("px") else {
                return Err(D::Error::custom("expected string to end with 'px'"));
            };

            match string.trim().parse::<f32>() {
                Ok(pixels) if pixels >= 0. => Ok(px(pixels)),
                _ => Err(D::Error::custom("could not convert string into pixels")),
            }
        }

        StringOrFloat::Float(pixels) if pixels >= 0. => Ok(px(pixels)),
        StringOrFloat::Float(_) => Err(D::Error::custom("pixels can't be negative")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrFloat {
    String(String),
    Float(f32),
}
