//! Table-driven transliteration of non-Latin user queries into Latin-script candidates.
//!
//! Two tables are tried. `Primary` follows BGN/PCGN-style romanization; `Alternate`
//! follows the ICAO 9303 spellings printed in passports (and German umlaut
//! expansion), which is what many people type into their profile name.

#[derive(Debug, Clone, Copy)]
enum Table {
    Primary,
    Alternate,
}

/// Produce search candidates for `query`.
///
/// The trimmed original is always the first element. Each table contributes one
/// more candidate when the whole string transliterates to ASCII and the result is
/// new; characters without a mapping (e.g. CJK) make that table contribute nothing.
pub fn candidates(query: &str) -> Vec<String> {
    let original = query.trim();
    let mut out = vec![original.to_string()];
    for table in [Table::Primary, Table::Alternate] {
        if let Some(latin) = transliterate(original, table)
            && !out.contains(&latin)
        {
            out.push(latin);
        }
    }
    out
}

fn transliterate(text: &str, table: Table) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let lower = c.to_lowercase().next().unwrap_or(c);
        let next = chars.peek().map(|n| n.to_lowercase().next().unwrap_or(*n));
        if let Some(latin) = greek_digraph(lower, next) {
            chars.next();
            push_cased(&mut out, latin, c.is_uppercase());
            continue;
        }
        let latin = if lower.is_ascii() {
            // e.g. 'İ' lowercases to 'i' + combining dot
            lower.to_string()
        } else {
            map_char(lower, table)?.to_string()
        };
        push_cased(&mut out, &latin, c.is_uppercase());
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn push_cased(out: &mut String, latin: &str, upper: bool) {
    let mut chars = latin.chars();
    match chars.next() {
        Some(first) if upper => {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
        _ => out.push_str(latin),
    }
}

fn map_char(c: char, table: Table) -> Option<&'static str> {
    cyrillic(c, table)
        .or_else(|| greek(c))
        .or_else(|| latin_extended(c, table))
}

fn cyrillic(c: char, table: Table) -> Option<&'static str> {
    let alternate = matches!(table, Table::Alternate);
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'ё' if alternate => "e",
        'ё' => "yo",
        'є' if alternate => "ie",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'і' => "i",
        'ї' if alternate => "i",
        'ї' => "yi",
        'й' if alternate => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ў' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' if alternate => "ie",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' if alternate => "iu",
        'ю' => "yu",
        'я' if alternate => "ia",
        'я' => "ya",
        _ => return None,
    })
}

fn greek_digraph(first: char, second: Option<char>) -> Option<&'static str> {
    match (first, second?) {
        ('ο' | 'ό', 'υ' | 'ύ') => Some("ou"),
        ('α' | 'ά', 'υ' | 'ύ') => Some("av"),
        ('ε' | 'έ', 'υ' | 'ύ') => Some("ev"),
        _ => None,
    }
}

fn greek(c: char) -> Option<&'static str> {
    Some(match c {
        'α' | 'ά' => "a",
        'β' => "v",
        'γ' => "g",
        'δ' => "d",
        'ε' | 'έ' => "e",
        'ζ' => "z",
        'η' | 'ή' => "i",
        'θ' => "th",
        'ι' | 'ί' | 'ϊ' | 'ΐ' => "i",
        'κ' => "k",
        'λ' => "l",
        'μ' => "m",
        'ν' => "n",
        'ξ' => "x",
        'ο' | 'ό' => "o",
        'π' => "p",
        'ρ' => "r",
        'σ' | 'ς' => "s",
        'τ' => "t",
        'υ' | 'ύ' | 'ϋ' | 'ΰ' => "y",
        'φ' => "f",
        'χ' => "ch",
        'ψ' => "ps",
        'ω' | 'ώ' => "o",
        _ => return None,
    })
}

fn latin_extended(c: char, table: Table) -> Option<&'static str> {
    let alternate = matches!(table, Table::Alternate);
    Some(match c {
        'ä' if alternate => "ae",
        'ö' if alternate => "oe",
        'ü' if alternate => "ue",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' | 'ĺ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'þ' => "th",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_name_gets_latin_candidate() {
        let c = candidates("Иван Петров");
        assert_eq!(c, vec!["Иван Петров".to_string(), "Ivan Petrov".to_string()]);
    }

    #[test]
    fn tables_diverge_on_ambiguous_letters() {
        let c = candidates("Юлия Соловьёва");
        assert_eq!(c[0], "Юлия Соловьёва");
        assert_eq!(c[1], "Yuliya Solovyova");
        assert_eq!(c[2], "Iuliia Soloveva");
    }

    #[test]
    fn multi_letter_capitals_keep_title_case() {
        let c = candidates("Щукин Жора");
        assert_eq!(c[1], "Shchukin Zhora");
    }

    #[test]
    fn greek_with_tonos_and_digraphs() {
        let c = candidates("Νίκος Παπαδόπουλος");
        assert_eq!(c[1], "Nikos Papadopoulos");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn diacritics_fold_and_umlauts_expand() {
        let c = candidates("Jürgen Müller");
        assert_eq!(c, vec!["Jürgen Müller", "Jurgen Muller", "Juergen Mueller"]);
    }

    #[test]
    fn uncovered_script_yields_only_original() {
        assert_eq!(candidates("山田太郎"), vec!["山田太郎".to_string()]);
    }

    #[test]
    fn partially_covered_text_yields_only_original() {
        assert_eq!(candidates("Иван 李"), vec!["Иван 李".to_string()]);
    }

    #[test]
    fn ascii_input_yields_only_original() {
        assert_eq!(candidates("  plain  "), vec!["plain".to_string()]);
    }

    #[test]
    fn signs_only_input_yields_no_candidate() {
        assert_eq!(candidates("ьъ"), vec!["ьъ".to_string(), "ie".to_string()]);
        assert_eq!(candidates("ь"), vec!["ь".to_string()]);
    }
}
