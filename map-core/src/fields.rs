use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Read access to one source row, keyed by (normalized) header name.
pub trait Row {
    /// Trimmed value of `column`, `None` when the column is missing or blank.
    fn field(&self, column: &str) -> Option<&str>;
}

/// Exact key first, then any key whose normalized form is `column`.
fn map_field<'m, K, V, S>(map: &'m HashMap<K, V, S>, column: &str) -> Option<&'m str>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
    S: BuildHasher,
{
    let value = map.get(column).or_else(|| {
        map.iter()
            .find(|(key, _)| normalize_header(<K as Borrow<str>>::borrow(key)) == column)
            .map(|(_, v)| v)
    })?;
    let v = value.as_ref().trim();
    (!v.is_empty()).then_some(v)
}

impl<S: BuildHasher> Row for HashMap<String, String, S> {
    fn field(&self, column: &str) -> Option<&str> {
        map_field(self, column)
    }
}

impl<S: BuildHasher> Row for HashMap<&str, &str, S> {
    fn field(&self, column: &str) -> Option<&str> {
        map_field(self, column)
    }
}

/// Fold the spelling variants found in source headers onto one form:
/// surrounding whitespace and a leading BOM are dropped, typographic
/// apostrophes become ASCII ones.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02bc}' | '\u{00b4}' => '\'',
            other => other,
        })
        .collect()
}

/// Ordered list of header names accepted for one logical field.
/// Names must already be in [`normalize_header`] form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldChain(&'static [&'static str]);

impl FieldChain {
    pub const fn new(keys: &'static [&'static str]) -> Self {
        FieldChain(keys)
    }

    pub fn keys(&self) -> &'static [&'static str] {
        self.0
    }

    /// First non-blank value along the chain.
    pub fn first<'r, R: Row + ?Sized>(&self, row: &'r R) -> Option<&'r str> {
        self.0.iter().find_map(|key| row.field(key))
    }

    pub fn first_owned<R: Row + ?Sized>(&self, row: &R) -> Option<String> {
        self.first(row).map(str::to_owned)
    }
}

/// Columns of the SIRENE business extracts (enterprises and public establishments).
pub mod business {
    use super::FieldChain;

    /// "A" for active, "F" for closed.
    pub const STATUS: FieldChain = FieldChain::new(&["Etat administratif de l'établissement"]);
    pub const SIRET: FieldChain = FieldChain::new(&["SIRET"]);
    pub const SIREN: FieldChain = FieldChain::new(&["SIREN"]);
    pub const NAME: FieldChain = FieldChain::new(&[
        "Enseigne de l'établissement 1",
        "Dénomination usuelle de l'établissement",
        "Dénomination de l'unité légale",
    ]);
    pub const ADDRESS: FieldChain =
        FieldChain::new(&["Adresse de l'établissement", "Adresse"]);
    pub const ADDRESS_COMPLEMENT: FieldChain =
        FieldChain::new(&["Complément d'adresse de l'établissement"]);
    pub const ACTIVITY: FieldChain =
        FieldChain::new(&["Activité principale de l'établissement"]);
    pub const CREATION_DATE: FieldChain =
        FieldChain::new(&["Date de création de l'établissement"]);

    /// NAF classification levels, coarsest first.
    pub const SECTION_LEVELS: [FieldChain; 4] = [
        FieldChain::new(&["Section de l'établissement"]),
        FieldChain::new(&["Sous-section de l'établissement"]),
        FieldChain::new(&["Division de l'établissement"]),
        FieldChain::new(&["Groupe de l'établissement"]),
    ];
}

/// Columns of the RNA association extract.
pub mod association {
    use super::FieldChain;

    pub const ID: FieldChain = FieldChain::new(&["id_association"]);
    pub const DISSOLUTION_DATE: FieldChain = FieldChain::new(&["date_dissolution"]);
    pub const NAME: FieldChain = FieldChain::new(&["titre_court", "titre"]);
    pub const PURPOSE: FieldChain = FieldChain::new(&["objet"]);
    pub const CREATION_DATE: FieldChain = FieldChain::new(&["date_creation"]);

    /// Street number, street type, street name; joined with spaces.
    pub const STREET_PARTS: [FieldChain; 3] = [
        FieldChain::new(&["num_voie"]),
        FieldChain::new(&["type_voie"]),
        FieldChain::new(&["libelle_voie"]),
    ];
}

/// Coordinate columns shared by every source.
pub mod coords {
    use super::FieldChain;

    /// "lat, lon" in one cell.
    pub const COMBINED: FieldChain =
        FieldChain::new(&["Géolocalisation de l'établissement", "latlong"]);
    pub const LATITUDE: FieldChain = FieldChain::new(&["lat", "latitude"]);
    pub const LONGITUDE: FieldChain = FieldChain::new(&["lon", "longitude"]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_chains() -> Vec<FieldChain> {
        let mut v = vec![
            business::STATUS,
            business::SIRET,
            business::SIREN,
            business::NAME,
            business::ADDRESS,
            business::ADDRESS_COMPLEMENT,
            business::ACTIVITY,
            business::CREATION_DATE,
            association::ID,
            association::DISSOLUTION_DATE,
            association::NAME,
            association::PURPOSE,
            association::CREATION_DATE,
            coords::COMBINED,
            coords::LATITUDE,
            coords::LONGITUDE,
        ];
        v.extend(business::SECTION_LEVELS);
        v.extend(association::STREET_PARTS);
        v
    }

    #[test]
    fn chain_keys_are_already_normalized() {
        for chain in all_chains() {
            for key in chain.keys() {
                assert_eq!(&normalize_header(key), key);
            }
        }
    }

    #[test]
    fn header_normalization_folds_apostrophes_and_bom() {
        assert_eq!(
            normalize_header("\u{feff} Géolocalisation de l\u{2019}établissement "),
            "Géolocalisation de l'établissement"
        );
    }

    #[test]
    fn map_rows_match_typographic_header_spellings() {
        let row: HashMap<String, String> = HashMap::from([(
            "Géolocalisation de l\u{2019}établissement".to_string(),
            "16.2,-61.48".to_string(),
        )]);
        assert_eq!(coords::COMBINED.first(&row), Some("16.2,-61.48"));
        assert_eq!(row.field("Géolocalisation de l\u{2019}établissement"), Some("16.2,-61.48"));
    }

    #[test]
    fn chain_skips_blank_values() {
        let row: HashMap<&str, &str> = HashMap::from([
            ("Enseigne de l'établissement 1", "   "),
            ("Dénomination de l'unité légale", " SARL Soleil "),
        ]);
        assert_eq!(business::NAME.first(&row), Some("SARL Soleil"));
        assert_eq!(business::ADDRESS.first(&row), None);
    }
}
