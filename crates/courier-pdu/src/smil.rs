//! SMIL presentation manifest.
//!
//! Every multipart message carries a small SMIL document that tells the
//! receiving client how to lay out the other parts: one slide per part, an
//! image region on top and a text region below.


use crate::part::PduPart;

/// Slide duration.
const SLIDE_DURATION: &str = "5000ms";

const HEAD: &str = concat!(
    "<smil><head><layout>",
    "<root-layout width=\"100%\" height=\"100%\"/>",
    "<region id=\"Image\" width=\"100%\" height=\"80%\" left=\"0%\" top=\"0%\" fit=\"meet\"/>",
    "<region id=\"Text\" width=\"100%\" height=\"20%\" left=\"0%\" top=\"80%\" fit=\"scroll\"/>",
    "</layout></head><body>",
);

const TAIL: &str = "</body></smil>";

/// Builds the SMIL document for `parts`, in order.
///
/// Each part is referenced by its name (falling back to its content
/// location). Parts without either are skipped.
#[must_use]
pub fn smil_document(parts: &[PduPart]) -> String {
    let mut doc = String::from(HEAD);

    for part in parts {
        let Some(src) = part.display_name() else {
            tracing::debug!("Part without a name left out of the manifest");
            continue;
        };
        let src = escape(src);
        let element = match part.content_type.main_type.as_str() {
            "image" => format!("<img src=\"{src}\" region=\"Image\"/>"),
            "video" => format!("<video src=\"{src}\" region=\"Image\"/>"),
            "audio" => format!("<audio src=\"{src}\"/>"),
            "text" => format!("<text src=\"{src}\" region=\"Text\"/>"),
            _ => format!("<ref src=\"{src}\"/>"),
        };
        doc.push_str(&format!("<par dur=\"{SLIDE_DURATION}\">{element}</par>"));
    }

    doc.push_str(TAIL);
    doc
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::part::Part;

    fn pdu(name: &str, mime: &str) -> PduPart {
        PduPart::from_part(&Part::new(name, mime, vec![0]).unwrap()).unwrap()
    }

    #[test]
    fn test_slides_in_order() {
        let doc = smil_document(&[
            pdu("image0", "image/jpeg"),
            pdu("audio", "audio/amr"),
            pdu("text", "text/plain"),
        ]);

        let img = doc.find("<img src=\"image0\"").unwrap();
        let audio = doc.find("<audio src=\"audio\"").unwrap();
        let text = doc.find("<text src=\"text\" region=\"Text\"").unwrap();
        assert!(img < audio && audio < text);
        assert_eq!(doc.matches("<par ").count(), 3);
        assert!(doc.starts_with("<smil>"));
        assert!(doc.ends_with("</smil>"));
    }

    #[test]
    fn test_each_slide_wraps_its_element() {
        let doc = smil_document(&[pdu("image0", "image/jpeg")]);
        assert!(doc.contains(
            "<par dur=\"5000ms\"><img src=\"image0\" region=\"Image\"/></par>"
        ));
    }

    #[test]
    fn test_unknown_type_uses_ref() {
        let doc = smil_document(&[pdu("application", "application/pdf")]);
        assert!(doc.contains("<ref src=\"application\"/>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let doc = smil_document(&[pdu("a\"&b", "image/png")]);
        assert!(doc.contains("src=\"a&quot;&amp;b\""));
    }

    #[test]
    fn test_empty_manifest() {
        let doc = smil_document(&[]);
        assert!(!doc.contains("<par"));
        assert!(doc.contains("<region id=\"Image\""));
    }
}
