//! Scannable ticket encoding.
//!
//! The approval pipeline turns a small fixed-shape claim into a QR image a
//! door scanner can read back. Encoding is pure and deterministic: the same
//! claim always yields the same PNG bytes. Failure never aborts an approval;
//! a transaction whose image could not be rendered is still a valid ticket,
//! just without visual proof.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use image::{DynamicImage, Rgb};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rendered module color, matching the event branding.
const DARK: Rgb<u8> = Rgb([0x66, 0x7e, 0xea]);
/// Background color.
const LIGHT: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
/// Minimum rendered image dimension in pixels.
const MIN_SIZE: u32 = 300;

/// The data a scanner recovers from a ticket image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketClaim {
    /// Buyer name as entered at purchase.
    pub buyer: String,
    /// Number of admissions the ticket grants.
    pub tickets: u32,
    /// Local transaction id.
    pub transaction: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
}

/// Encodes ticket claims into scannable images.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketCodec;

impl TicketCodec {
    /// Creates the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders the claim as a PNG data URL.
    ///
    /// Returns `None` when serialization or rendering fails; the failure is
    /// logged and the caller proceeds without an image.
    #[must_use]
    pub fn encode(&self, claim: &TicketClaim) -> Option<String> {
        match self.render(claim) {
            Ok(data_url) => Some(data_url),
            Err(reason) => {
                warn!(transaction = %claim.transaction, %reason, "ticket image encoding failed");
                None
            }
        }
    }

    fn render(&self, claim: &TicketClaim) -> std::result::Result<String, String> {
        let payload =
            serde_json::to_vec(claim).map_err(|e| format!("claim serialization: {e}"))?;

        let code = QrCode::new(&payload).map_err(|e| format!("qr construction: {e}"))?;
        let rendered = code
            .render::<Rgb<u8>>()
            .min_dimensions(MIN_SIZE, MIN_SIZE)
            .dark_color(DARK)
            .light_color(LIGHT)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(rendered)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| format!("png encoding: {e}"))?;

        Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
    }
}
