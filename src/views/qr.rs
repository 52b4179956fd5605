//! Marcador de código QR
//!
//! Dibuja un patrón fijo con aspecto de QR. No es una codificación real:
//! la URL del camión se muestra como texto debajo.

use crate::utils::html::escape;

const PATTERN: [&str; 21] = [
    "1111111000001111111",
    "1000001000001000001",
    "1011101000001011101",
    "1011101000001011101",
    "1011101000001011101",
    "1000001000001000001",
    "1111111101011111111",
    "0000000000000000000",
    "1010111010101010111",
    "0000001010100000001",
    "1111101010101111101",
    "0000101010100000101",
    "1111101010101111101",
    "0000000000000000000",
    "1111111101011111111",
    "1000001000001000001",
    "1011101000001011101",
    "1011101000001011101",
    "1011101000001011101",
    "1000001000001000001",
    "1111111000001111111",
];

pub const DEFAULT_SIZE: u32 = 200;

pub fn qr_svg(size: u32) -> String {
    let cell = size / 25;
    let width = PATTERN[0].len() as u32 * cell;
    let height = PATTERN.len() as u32 * cell;
    let offset_x = (size - width) / 2;
    let offset_y = (size - height) / 2;

    let cells: String = PATTERN
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.chars()
                .enumerate()
                .filter(|(_, c)| *c == '1')
                .map(move |(x, _)| {
                    format!(
                        r##"<rect x="{}" y="{}" width="{cell}" height="{cell}" fill="#000000"/>"##,
                        offset_x + x as u32 * cell,
                        offset_y + y as u32 * cell,
                        cell = cell,
                    )
                })
        })
        .collect();

    format!(
        r##"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg"><rect width="{size}" height="{size}" fill="#FFFFFF"/>{cells}</svg>"##,
        size = size,
        cells = cells,
    )
}

/// Bloque con el patrón y la URL de detalle del camión
pub fn qr_block(value: &str) -> String {
    format!(
        r#"<div class="qr-code"><div>{svg}</div><div class="muted" style="font-size:.75rem">Scan to view truck details</div><div class="muted" style="font-size:.75rem">{value}</div></div>"#,
        svg = qr_svg(DEFAULT_SIZE),
        value = escape(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_draws_every_dark_cell() {
        let svg = qr_svg(DEFAULT_SIZE);
        let dark = PATTERN.iter().map(|row| row.matches('1').count()).sum::<usize>();
        // el fondo también es un <rect>
        assert_eq!(svg.matches("<rect").count(), dark + 1);
        assert!(svg.starts_with("<svg width=\"200\""));
    }

    #[test]
    fn test_block_shows_url() {
        let html = qr_block("http://localhost:3000/trucks/abc");
        assert!(html.contains("Scan to view truck details"));
        assert!(html.contains("http://localhost:3000/trucks/abc"));
    }
}
