//! A4 print sheet for a batch of cards
//!
//! Cards are tiled into a fixed 4-column grid and the browser paginates the
//! rows. The stylesheet is scoped to the mount id: hidden on screen, and when
//! printing everything except the mount is hidden.

use uuid::Uuid;

use crate::artifact::PrintDocument;

pub const SHEET_COLUMNS: usize = 4;

/// Card zoom inside the grid: 46.25mm cell width over the 100mm card
const CARD_ZOOM: &str = "0.4625";

/// Tile rendered card fragments into a printable sheet
pub fn print_sheet(cards: &[String]) -> PrintDocument {
    let mount_id = format!("coupon-print-{}", Uuid::new_v4().simple());
    let rows = cards.len().div_ceil(SHEET_COLUMNS);

    let mut markup = format!(r#"<div id="{mount_id}" class="coupon-print-sheet">"#);
    for card in cards {
        markup.push_str(r#"<div class="coupon-print-sheet__cell">"#);
        markup.push_str(card);
        markup.push_str("</div>");
    }
    markup.push_str("</div>");

    PrintDocument {
        stylesheet: stylesheet(&mount_id),
        mount_id,
        markup,
        card_count: cards.len(),
        columns: SHEET_COLUMNS,
        rows,
    }
}

fn stylesheet(id: &str) -> String {
    format!(
        concat!(
            "@media screen{{#{id}{{display:none;}}}}",
            "@media print{{",
            "@page{{size:A4;margin:0;}}",
            "body>*:not(#{id}){{display:none!important;}}",
            "#{id}{{display:grid;grid-template-columns:repeat({cols},1fr);gap:5mm;padding:5mm;",
            "max-width:210mm;box-sizing:border-box;}}",
            "#{id} .coupon-card{{zoom:{zoom};}}",
            "}}"
        ),
        id = id,
        cols = SHEET_COLUMNS,
        zoom = CARD_ZOOM,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!(r#"<div class="coupon-card" data-code="C{i}"></div>"#))
            .collect()
    }

    #[test]
    fn test_rows() {
        assert_eq!(print_sheet(&cards(1)).rows, 1);
        assert_eq!(print_sheet(&cards(4)).rows, 1);
        assert_eq!(print_sheet(&cards(9)).rows, 3);
        assert_eq!(print_sheet(&cards(12)).rows, 3);
    }

    #[test]
    fn test_markup_and_scoped_stylesheet() {
        let doc = print_sheet(&cards(9));
        assert_eq!(doc.card_count, 9);
        assert_eq!(doc.columns, 4);
        assert_eq!(doc.markup.matches("coupon-print-sheet__cell").count(), 9);
        assert!(doc.markup.starts_with(&format!(r#"<div id="{}""#, doc.mount_id)));
        assert!(doc.stylesheet.contains("grid-template-columns:repeat(4,1fr)"));
        assert!(doc.stylesheet.contains("size:A4"));
        assert!(doc.stylesheet.contains(&format!("body>*:not(#{})", doc.mount_id)));
    }

    #[test]
    fn test_mount_ids_are_unique() {
        assert_ne!(print_sheet(&cards(1)).mount_id, print_sheet(&cards(1)).mount_id);
    }
}
