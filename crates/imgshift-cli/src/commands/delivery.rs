//! `delivery-url` handler.

use std::borrow::Cow;

use imgshift_config::defaults::PLACEHOLDER_CLOUD_NAME;
use imgshift_gateway::{Preset, Transformation, delivery_url, transform_url};
use tracing::warn;

use crate::cli::{DeliveryUrlArgs, OutputFormat};
use crate::client::{CliError, CliResult};
use crate::output::render_delivery_url;

pub(crate) fn handle_delivery_url(args: &DeliveryUrlArgs, format: OutputFormat) -> CliResult<()> {
    let url = build_delivery_url(args)?;
    render_delivery_url(&url, format)
}

fn transformation(args: &DeliveryUrlArgs) -> Transformation {
    let mut transformation = args
        .preset
        .map_or_else(Transformation::new, Preset::transformation);
    if let Some(width) = args.width {
        transformation = transformation.width(width);
    }
    if let Some(height) = args.height {
        transformation = transformation.height(height);
    }
    transformation
}

fn build_delivery_url(args: &DeliveryUrlArgs) -> CliResult<String> {
    let target = args.target.trim();
    if target.is_empty() {
        return Err(CliError::validation("a public id or URL is required"));
    }
    let transformation = transformation(args);

    if target.starts_with("http://") || target.starts_with("https://") {
        let url = transform_url(target, &transformation);
        if matches!(url, Cow::Borrowed(_)) {
            warn!(url = %target, "not a Cloudinary delivery URL; returned unchanged");
        }
        return Ok(url.into_owned());
    }

    let cloud_name = args
        .cloud_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(PLACEHOLDER_CLOUD_NAME))
        .ok_or_else(|| {
            CliError::validation(
                "cloud name is required for public ids (pass --cloud-name or set IMGSHIFT_CLOUD_NAME)",
            )
        })?;
    Ok(delivery_url(cloud_name, target, &transformation))
}
