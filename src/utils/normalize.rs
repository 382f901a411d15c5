//! Umlaut normalization for BibTeX returned by zbMATH.
//!
//! Some records spell umlauts as `\"a`; the parser expects the precomposed
//! characters instead.

const LOWERCASE: [(&str, &str); 3] = [("\\\"a", "ä"), ("\\\"o", "ö"), ("\\\"u", "ü")];
const UPPERCASE: [(&str, &str); 3] = [("\\\"A", "Ä"), ("\\\"O", "Ö"), ("\\\"U", "Ü")];

/// Replace every `\"a`, `\"o`, `\"u` (then `\"A`, `\"O`, `\"U`) with its umlaut.
///
/// No other characters are touched.
pub fn normalize_umlauts(text: &str) -> String {
    let mut out = text.to_string();
    for (escape, umlaut) in LOWERCASE.iter().chain(UPPERCASE.iter()) {
        if out.contains(escape) {
            out = out.replace(escape, umlaut);
        }
    }
    out
}
