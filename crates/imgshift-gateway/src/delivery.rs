//! Delivery URLs for migrated assets.
//!
//! Cloudinary applies transformations encoded as a path segment right after
//! `/image/upload/`, e.g. `w_400,h_300,c_fill,q_auto,f_auto`.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Host serving delivered assets.
pub const DELIVERY_HOST: &str = "res.cloudinary.com";

const UPLOAD_SEGMENT: &str = "/upload/";

/// Resize mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    /// Fill the box exactly, cropping overflow.
    Fill,
    /// Fit inside the box, keeping the aspect ratio.
    Fit,
    /// Shrink only when larger than the box.
    Limit,
    /// Stretch to the box.
    Scale,
}

impl Crop {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Fit => "fit",
            Self::Limit => "limit",
            Self::Scale => "scale",
        }
    }
}

/// Chain of delivery transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    width: Option<u32>,
    height: Option<u32>,
    crop: Option<Crop>,
    auto_quality: bool,
    auto_format: bool,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformation {
    /// Automatic quality and format, no resizing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            width: None,
            height: None,
            crop: None,
            auto_quality: true,
            auto_format: true,
        }
    }

    /// Target width in pixels.
    #[must_use]
    pub const fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Target height in pixels.
    #[must_use]
    pub const fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Resize mode.
    #[must_use]
    pub const fn crop(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Toggle `q_auto`.
    #[must_use]
    pub const fn auto_quality(mut self, enabled: bool) -> Self {
        self.auto_quality = enabled;
        self
    }

    /// Toggle `f_auto`.
    #[must_use]
    pub const fn auto_format(mut self, enabled: bool) -> Self {
        self.auto_format = enabled;
        self
    }

    /// True when the chain renders to an empty segment.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.crop.is_none()
            && !self.auto_quality
            && !self.auto_format
    }
}

impl Display for Transformation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<Cow<'static, str>> = Vec::with_capacity(5);
        if let Some(width) = self.width {
            parts.push(format!("w_{width}").into());
        }
        if let Some(height) = self.height {
            parts.push(format!("h_{height}").into());
        }
        if let Some(crop) = self.crop {
            parts.push(format!("c_{}", crop.as_str()).into());
        }
        if self.auto_quality {
            parts.push("q_auto".into());
        }
        if self.auto_format {
            parts.push("f_auto".into());
        }
        formatter.write_str(&parts.join(","))
    }
}

/// Named transformation presets used by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 200×200 fill.
    Thumbnail,
    /// 400×300 fill.
    Card,
    /// 800 wide, never upscaled.
    Detail,
}

impl Preset {
    /// Transformation chain of the preset.
    #[must_use]
    pub const fn transformation(self) -> Transformation {
        let base = Transformation::new();
        match self {
            Self::Thumbnail => base.width(200).height(200).crop(Crop::Fill),
            Self::Card => base.width(400).height(300).crop(Crop::Fill),
            Self::Detail => base.width(800).crop(Crop::Limit),
        }
    }

    /// Stable name of the preset.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Card => "card",
            Self::Detail => "detail",
        }
    }
}

/// Preset name did not match any known preset.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown delivery preset '{0}'")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "thumbnail" => Ok(Self::Thumbnail),
            "card" => Ok(Self::Card),
            "detail" => Ok(Self::Detail),
            _ => Err(UnknownPreset(value.to_string())),
        }
    }
}

/// Delivery URL for a public id, e.g. `products/product-42`.
#[must_use]
pub fn delivery_url(cloud_name: &str, public_id: &str, transformation: &Transformation) -> String {
    let public_id = public_id.trim_start_matches('/');
    if transformation.is_empty() {
        format!("https://{DELIVERY_HOST}/{cloud_name}/image/upload/{public_id}")
    } else {
        format!("https://{DELIVERY_HOST}/{cloud_name}/image/upload/{transformation}/{public_id}")
    }
}

/// Insert a transformation after `/upload/` in an existing delivery URL.
///
/// URLs not served by [`DELIVERY_HOST`], or without an upload segment, are returned
/// unchanged.
#[must_use]
pub fn transform_url<'a>(url: &'a str, transformation: &Transformation) -> Cow<'a, str> {
    if transformation.is_empty() || !url.contains(DELIVERY_HOST) || !url.contains(UPLOAD_SEGMENT) {
        return Cow::Borrowed(url);
    }
    Cow::Owned(url.replacen(UPLOAD_SEGMENT, &format!("{UPLOAD_SEGMENT}{transformation}/"), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATED: &str = "https://res.cloudinary.com/demo/image/upload/v1/products/product-3.png";

    #[test]
    fn presets_render_expected_chains() {
        assert_eq!(
            Preset::Thumbnail.transformation().to_string(),
            "w_200,h_200,c_fill,q_auto,f_auto"
        );
        assert_eq!(
            Preset::Card.transformation().to_string(),
            "w_400,h_300,c_fill,q_auto,f_auto"
        );
        assert_eq!(
            Preset::Detail.transformation().to_string(),
            "w_800,c_limit,q_auto,f_auto"
        );
    }

    #[test]
    fn delivery_url_places_transformation_before_public_id() {
        assert_eq!(
            delivery_url("demo", "products/product-3", &Preset::Card.transformation()),
            "https://res.cloudinary.com/demo/image/upload/w_400,h_300,c_fill,q_auto,f_auto/products/product-3"
        );
        let bare = Transformation::new().auto_quality(false).auto_format(false);
        assert_eq!(
            delivery_url("demo", "/products/product-3", &bare),
            "https://res.cloudinary.com/demo/image/upload/products/product-3"
        );
    }

    #[test]
    fn transform_url_rewrites_only_cdn_urls() {
        let thumb = Preset::Thumbnail.transformation();
        assert_eq!(
            transform_url(MIGRATED, &thumb),
            "https://res.cloudinary.com/demo/image/upload/w_200,h_200,c_fill,q_auto,f_auto/v1/products/product-3.png"
        );
        let external = "https://images.example.com/upload/1.jpg";
        assert!(matches!(transform_url(external, &thumb), Cow::Borrowed(_)));
    }

    #[test]
    fn preset_names_parse_case_insensitively() {
        assert_eq!("Card".parse::<Preset>(), Ok(Preset::Card));
        assert_eq!(Preset::Detail.as_str(), "detail");
        assert_eq!(
            "hero".parse::<Preset>(),
            Err(UnknownPreset("hero".to_string()))
        );
    }
}
