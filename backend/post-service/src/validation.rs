/// Request validation for post create/update
///
/// Text fields are checked with `validator` derives on [`PostForm`]; the image
/// upload is checked here by sniffing its bytes. Failures are collected into a
/// [`FieldErrors`] map keyed by field name, each holding the list of messages
/// for that field.
use crate::error::{AppError, Result};
use crate::models::{PostForm, UploadedFile};
use image::ImageFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use validator::{Validate, ValidationErrors};

/// Largest accepted image, in kilobytes
pub const MAX_IMAGE_KILOBYTES: usize = 2048;

pub const MSG_IMAGE_REQUIRED: &str = "The image field is required.";
pub const MSG_IMAGE_NOT_IMAGE: &str = "The image must be an image.";
pub const MSG_IMAGE_MIMES: &str = "The image must be a file of type: jpeg, png, jpg, gif, svg.";
pub const MSG_IMAGE_TOO_LARGE: &str = "The image must not be greater than 2048 kilobytes.";

/// Field name -> validation messages, serialized as a bare JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// `Ok(())` when nothing failed, otherwise `AppError::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field));
                out.add(&field, message);
            }
        }
        out
    }
}

/// Image encodings recognised by content sniffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
}

impl ImageKind {
    /// Detect the encoding from the leading bytes of a file
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => Some(ImageKind::Jpeg),
            Ok(ImageFormat::Png) => Some(ImageKind::Png),
            Ok(ImageFormat::Gif) => Some(ImageKind::Gif),
            Ok(ImageFormat::Bmp) => Some(ImageKind::Bmp),
            Ok(ImageFormat::WebP) => Some(ImageKind::Webp),
            _ if looks_like_svg(bytes) => Some(ImageKind::Svg),
            _ => None,
        }
    }

    /// File extension used when generating stored names
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::Webp => "webp",
            ImageKind::Svg => "svg",
        }
    }

    /// Accepted for post images (jpeg, png, jpg, gif, svg)
    pub fn is_allowed(self) -> bool {
        matches!(
            self,
            ImageKind::Jpeg | ImageKind::Png | ImageKind::Gif | ImageKind::Svg
        )
    }

    fn raster_format(self) -> Option<ImageFormat> {
        match self {
            ImageKind::Jpeg => Some(ImageFormat::Jpeg),
            ImageKind::Png => Some(ImageFormat::Png),
            ImageKind::Gif => Some(ImageFormat::Gif),
            ImageKind::Bmp => Some(ImageFormat::Bmp),
            ImageKind::Webp => Some(ImageFormat::WebP),
            ImageKind::Svg => None,
        }
    }

    /// Raster images must have a readable header; SVG is accepted on sniffing alone.
    pub fn decodes(self, bytes: &[u8]) -> bool {
        match self.raster_format() {
            Some(format) => image::io::Reader::with_format(Cursor::new(bytes), format)
                .into_dimensions()
                .is_ok(),
            None => true,
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let text = text.trim_start_matches('\u{feff}').trim_start();

    let svg_prologue = text.starts_with("<?xml")
        || text.starts_with("<!doctype svg")
        || text.starts_with("<svg")
        || text.starts_with("<!--");

    svg_prologue && text.contains("<svg")
}

/// Messages for the image rules: required, image, allowed types, max size.
/// A missing image reports only the required message.
pub fn image_rule_messages(image: Option<&UploadedFile>) -> Vec<&'static str> {
    let Some(file) = image else {
        return vec![MSG_IMAGE_REQUIRED];
    };

    let mut messages = Vec::new();
    let kind = ImageKind::sniff(&file.bytes);

    if !kind.is_some_and(|k| k.decodes(&file.bytes)) {
        messages.push(MSG_IMAGE_NOT_IMAGE);
    }
    if !kind.is_some_and(ImageKind::is_allowed) {
        messages.push(MSG_IMAGE_MIMES);
    }
    if file.bytes.len() > MAX_IMAGE_KILOBYTES * 1024 {
        messages.push(MSG_IMAGE_TOO_LARGE);
    }

    messages
}

fn text_field_errors(form: &PostForm) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::default(),
        Err(errors) => errors.into(),
    }
}

/// Rules for creating a post: image, title and content are all required.
pub fn validate_create(form: &PostForm) -> Result<()> {
    let mut errors = text_field_errors(form);
    for message in image_rule_messages(form.image.as_ref()) {
        errors.add("image", message);
    }
    errors.into_result()
}

/// Rules for updating a post: title and content are required, the image is optional
/// and not checked.
pub fn validate_update(form: &PostForm) -> Result<()> {
    text_field_errors(form).into_result()
}
