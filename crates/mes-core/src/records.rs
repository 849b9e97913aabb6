//! Per-kind schemas for the records served by the MES API.
//!
//! The API is loose about shapes: fields may be missing, some clients write
//! English names where the backend uses French ones, and serialisers that add
//! virtuals send both `_id` and `id`. Every field is therefore optional and
//! defaulted, and each object is canonicalised before decoding: of all the
//! spellings of a field, the first non-null one wins and the others are
//! removed. Use sites never inspect raw JSON.

use crate::matching::Needle;
use crate::types::{ResourceKind, SearchResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical key and its alternative spellings, in order of preference.
pub type Spellings = &'static [(&'static str, &'static [&'static str])];

/// Behaviour shared by the four record schemas.
pub trait Record: DeserializeOwned {
    const KIND: ResourceKind;

    const SPELLINGS: Spellings;

    /// Rewrite a raw object so every field appears under its canonical key.
    fn canonicalize(value: Value) -> Value {
        canonicalize(value, Self::SPELLINGS)
    }

    /// Fields inspected by the search filter, in no particular order.
    fn search_fields(&self) -> Vec<&str>;

    fn display_name(&self) -> Option<String>;

    fn description(&self) -> String;

    /// Extra lines shown under the record when it is selected in a listing.
    fn details(&self) -> Vec<String> {
        Vec::new()
    }

    /// Project into a search result, keeping the raw record alongside.
    fn to_result(&self, raw: Value) -> SearchResult {
        SearchResult {
            kind: Self::KIND.into(),
            display_name: self
                .display_name()
                .unwrap_or_else(|| "(sans nom)".to_string()),
            description: self.description(),
            navigation_path: Self::KIND.listing_path().to_string(),
            icon: Self::KIND.icon(),
            category: Self::KIND.category().to_string(),
            raw_record: Some(raw),
        }
    }
}

/// Keep the first non-null spelling of each field under its canonical key.
/// Non-objects pass through untouched.
pub fn canonicalize(value: Value, spellings: Spellings) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    for (canonical, alternatives) in spellings {
        let chosen = std::iter::once(*canonical)
            .chain(alternatives.iter().copied())
            .find_map(|key| map.get(key).filter(|v| !v.is_null()).cloned());
        for alternative in *alternatives {
            map.remove(*alternative);
        }
        if let Some(value) = chosen {
            map.insert(canonical.to_string(), value);
        }
    }
    Value::Object(map)
}

fn canonicalize_nested(map: &mut Map<String, Value>, key: &str, spellings: Spellings) {
    match map.get_mut(key) {
        Some(Value::Array(items)) => {
            for item in items.iter_mut() {
                *item = canonicalize(item.take(), spellings);
            }
        }
        Some(nested @ Value::Object(_)) => *nested = canonicalize(nested.take(), spellings),
        _ => {}
    }
}

/// Numbers typed into forms sometimes arrive as strings.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

const ID: (&str, &[&str]) = ("id", &["_id"]);
const NOM: (&str, &[&str]) = ("nom", &["name"]);
const STATUT: (&str, &[&str]) = ("statut", &["status"]);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub nom: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub numero_serie: Option<String>,
    pub localisation: Option<String>,
    pub specifications: Option<String>,
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supplier {
    pub nom: Option<String>,
    pub contact: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub nom: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub quantite_stock: Option<f64>,
    pub unite: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub seuil_minimum: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub prix_unitaire: Option<f64>,
    pub fournisseur: Option<Supplier>,
}

impl Material {
    /// Stock strictly under the alert threshold.
    pub fn is_below_threshold(&self) -> bool {
        match (self.quantite_stock, self.seuil_minimum) {
            (Some(stock), Some(min)) => stock < min,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operator {
    pub id: Option<String>,
    pub matricule: Option<String>,
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub competences: Vec<String>,
    pub statut: Option<String>,
}

/// One step (étape) of a manufacturing process. Resources are counted, not
/// resolved, so ids and populated objects are both accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    #[serde(deserialize_with = "lenient_number")]
    pub numero: Option<f64>,
    pub nom: Option<String>,
    pub description: Option<String>,
    /// Minutes.
    #[serde(deserialize_with = "lenient_number")]
    pub duree_estimee: Option<f64>,
    pub equipements: Vec<Value>,
    pub operateurs: Vec<Value>,
    pub materiaux: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Process {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub nom: Option<String>,
    pub description: Option<String>,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub statut: Option<String>,
    pub etapes: Vec<Step>,
}

impl Process {
    pub fn starts_on(&self) -> Option<NaiveDate> {
        self.date_debut.as_deref().and_then(parse_date)
    }

    pub fn ends_on(&self) -> Option<NaiveDate> {
        self.date_fin.as_deref().and_then(parse_date)
    }

    /// False only when both dates are known and the end precedes the start.
    pub fn has_valid_period(&self) -> bool {
        match (self.starts_on(), self.ends_on()) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    /// `01/03/2024 → 15/03/2024`, with `?` for a missing or unreadable date.
    /// `None` when neither date is set.
    pub fn period(&self) -> Option<String> {
        if self.date_debut.is_none() && self.date_fin.is_none() {
            return None;
        }
        let show = |d: Option<NaiveDate>| {
            d.map_or_else(|| "?".to_string(), |d| d.format("%d/%m/%Y").to_string())
        };
        let mut period = format!("{} → {}", show(self.starts_on()), show(self.ends_on()));
        if !self.has_valid_period() {
            period.push_str(" ⚠ période incohérente");
        }
        Some(period)
    }
}

/// Accepts RFC 3339 timestamps (as the backend serialises them) and bare
/// `YYYY-MM-DD` dates (as forms submit them).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

// ---------------------------------------------------------------------------
// Record impls
// ---------------------------------------------------------------------------

fn non_empty(fields: &[&Option<String>]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn present<'a>(fields: &[&'a Option<String>]) -> Vec<&'a str> {
    fields.iter().filter_map(|f| f.as_deref()).collect()
}

impl Record for Equipment {
    const KIND: ResourceKind = ResourceKind::Equipment;
    const SPELLINGS: Spellings = &[
        ID,
        NOM,
        STATUT,
        ("numero_serie", &["numeroSerie", "serialNumber"]),
    ];

    fn search_fields(&self) -> Vec<&str> {
        present(&[&self.nom, &self.kind, &self.numero_serie])
    }

    fn display_name(&self) -> Option<String> {
        non_empty(&[&self.nom, &self.reference]).into_iter().next()
    }

    fn description(&self) -> String {
        non_empty(&[&self.kind, &self.numero_serie, &self.statut]).join(" · ")
    }
}

const SUPPLIER_SPELLINGS: Spellings = &[NOM];

impl Record for Material {
    const KIND: ResourceKind = ResourceKind::Material;
    const SPELLINGS: Spellings = &[
        ID,
        NOM,
        ("quantite_stock", &["quantiteStock"]),
        ("seuil_minimum", &["seuilMinimum"]),
        ("prix_unitaire", &["prixUnitaire"]),
    ];

    fn canonicalize(value: Value) -> Value {
        let mut value = canonicalize(value, Self::SPELLINGS);
        if let Value::Object(map) = &mut value {
            canonicalize_nested(map, "fournisseur", SUPPLIER_SPELLINGS);
        }
        value
    }

    fn search_fields(&self) -> Vec<&str> {
        present(&[&self.nom, &self.kind, &self.description])
    }

    fn display_name(&self) -> Option<String> {
        non_empty(&[&self.nom, &self.reference]).into_iter().next()
    }

    fn description(&self) -> String {
        let mut parts = non_empty(&[&self.kind, &self.description]);
        if let Some(stock) = self.quantite_stock {
            let unit = self.unite.as_deref().unwrap_or("");
            parts.push(
                format!("stock {} {unit}", format_number(stock))
                    .trim_end()
                    .to_string(),
            );
        }
        if self.is_below_threshold() {
            parts.push("⚠ stock faible".to_string());
        }
        if let Some(supplier) = self.fournisseur.as_ref().and_then(|f| non_empty(&[&f.nom]).pop()) {
            parts.push(format!("fournisseur {supplier}"));
        }
        parts.join(" · ")
    }
}

impl Record for Operator {
    const KIND: ResourceKind = ResourceKind::Operator;
    const SPELLINGS: Spellings = &[ID, NOM, STATUT, ("prenom", &["surname", "firstName"])];

    fn search_fields(&self) -> Vec<&str> {
        present(&[&self.nom, &self.prenom, &self.role, &self.email])
    }

    fn display_name(&self) -> Option<String> {
        let full = non_empty(&[&self.prenom, &self.nom]).join(" ");
        if full.is_empty() {
            non_empty(&[&self.matricule]).into_iter().next()
        } else {
            Some(full)
        }
    }

    fn description(&self) -> String {
        non_empty(&[&self.role, &self.email]).join(" · ")
    }
}

const STEP_SPELLINGS: Spellings = &[NOM, ("duree_estimee", &["dureeEstimee"])];

impl Record for Process {
    const KIND: ResourceKind = ResourceKind::Process;
    const SPELLINGS: Spellings = &[
        ID,
        NOM,
        STATUT,
        ("date_debut", &["dateDebut"]),
        ("date_fin", &["dateFin"]),
        ("etapes", &["steps"]),
    ];

    fn canonicalize(value: Value) -> Value {
        let mut value = canonicalize(value, Self::SPELLINGS);
        if let Value::Object(map) = &mut value {
            canonicalize_nested(map, "etapes", STEP_SPELLINGS);
        }
        value
    }

    fn search_fields(&self) -> Vec<&str> {
        present(&[&self.nom, &self.description])
    }

    fn display_name(&self) -> Option<String> {
        non_empty(&[&self.nom, &self.reference]).into_iter().next()
    }

    fn description(&self) -> String {
        let mut parts = non_empty(&[&self.description, &self.statut]);
        parts.push(format!("{} étape(s)", self.etapes.len()));
        parts.extend(self.period());
        parts.join(" · ")
    }

    fn details(&self) -> Vec<String> {
        self.etapes
            .iter()
            .enumerate()
            .map(|(idx, step)| {
                let numero = step
                    .numero
                    .map_or_else(|| (idx + 1).to_string(), format_number);
                let mut parts = vec![format!(
                    "{numero}. {}",
                    non_empty(&[&step.nom]).pop().unwrap_or_else(|| "(sans nom)".to_string())
                )];
                if let Some(minutes) = step.duree_estimee.filter(|m| *m > 0.0) {
                    parts.push(format!("{} min", format_number(minutes)));
                }
                parts.push(format!("{} équipement(s)", step.equipements.len()));
                parts.push(format!("{} opérateur(s)", step.operateurs.len()));
                parts.push(format!("{} matériau(x)", step.materiaux.len()));
                parts.join(" · ")
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Decoding and filtering
// ---------------------------------------------------------------------------

fn decode_one<R: Record>(idx: usize, value: &Value) -> Option<R> {
    if !value.is_object() {
        tracing::warn!(kind = %R::KIND, idx, "dropping non-object record");
        return None;
    }
    match serde_json::from_value::<R>(R::canonicalize(value.clone())) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(kind = %R::KIND, idx, error = %e, "dropping malformed record");
            None
        }
    }
}

/// Decode a listing response element by element. Elements that are not
/// objects, or whose fields have the wrong JSON type, are dropped. The raw
/// element is returned as received, before canonicalisation.
pub fn decode<R: Record>(raw: Vec<Value>) -> Vec<(R, Value)> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, value)| decode_one::<R>(idx, &value).map(|record| (record, value)))
        .collect()
}

fn filter_as<R: Record>(raw: Vec<Value>, needle: Option<&Needle>) -> Vec<SearchResult> {
    decode::<R>(raw)
        .into_iter()
        .filter(|(record, _)| needle.map_or(true, |n| n.matches_any(record.search_fields())))
        .map(|(record, value)| record.to_result(value))
        .collect()
}

/// Filter one source's response against the needle, preserving response order.
pub fn filter(kind: ResourceKind, raw: Vec<Value>, needle: &Needle) -> Vec<SearchResult> {
    match kind {
        ResourceKind::Equipment => filter_as::<Equipment>(raw, Some(needle)),
        ResourceKind::Material => filter_as::<Material>(raw, Some(needle)),
        ResourceKind::Operator => filter_as::<Operator>(raw, Some(needle)),
        ResourceKind::Process => filter_as::<Process>(raw, Some(needle)),
    }
}

/// Project every record of a listing, unfiltered. Used by page views.
pub fn project(kind: ResourceKind, raw: Vec<Value>) -> Vec<SearchResult> {
    match kind {
        ResourceKind::Equipment => filter_as::<Equipment>(raw, None),
        ResourceKind::Material => filter_as::<Material>(raw, None),
        ResourceKind::Operator => filter_as::<Operator>(raw, None),
        ResourceKind::Process => filter_as::<Process>(raw, None),
    }
}

/// Detail lines for one raw record, e.g. the steps of a process.
pub fn details(kind: ResourceKind, raw: &Value) -> Vec<String> {
    fn of<R: Record>(raw: &Value) -> Vec<String> {
        decode_one::<R>(0, raw).map(|r| r.details()).unwrap_or_default()
    }
    match kind {
        ResourceKind::Equipment => of::<Equipment>(raw),
        ResourceKind::Material => of::<Material>(raw),
        ResourceKind::Operator => of::<Operator>(raw),
        ResourceKind::Process => of::<Process>(raw),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
