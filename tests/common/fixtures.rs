//! Record collections served by the fake API.
//!
//! Names carry accents on purpose so harnesses exercise accent-insensitive
//! matching end to end. Some records carry both spellings of a field
//! (`_id` and `id`, `nom` and `name`) the way virtual-enabled serialisers
//! send them.

use serde_json::{json, Value};

pub fn equipements() -> Vec<Value> {
    vec![
        json!({
            "_id": "eq-1",
            "id": "eq-1",
            "nom": "Presse hydraulique",
            "type": "presse",
            "numeroSerie": "PH-2210",
            "statut": "disponible"
        }),
        json!({
            "_id": "eq-2",
            "nom": "Tour CNC",
            "type": "usinage",
            "numeroSerie": "TC-0042",
            "statut": "en maintenance"
        }),
        json!({
            "_id": "eq-3",
            "nom": "Four à induction",
            "type": "traitement thermique",
            "numeroSerie": "FI-7781"
        }),
    ]
}

pub fn materiaux() -> Vec<Value> {
    vec![
        json!({
            "_id": "mat-1",
            "nom": "Acier S235",
            "type": "métal",
            "quantiteStock": 1200,
            "unite": "kg",
            "seuilMinimum": 300
        }),
        json!({
            "_id": "mat-2",
            "nom": "Aluminium 6061",
            "type": "métal",
            "description": "Tôles pour emboutissage"
        }),
        // Wrong field type: dropped by the decoder, never fatal.
        json!({ "_id": "mat-3", "nom": 12 }),
    ]
}

pub fn operateurs() -> Vec<Value> {
    vec![
        json!({
            "_id": "op-1",
            "prenom": "Jean",
            "nom": "Dupont",
            "name": "Dupont",
            "role": "opérateur presse",
            "email": "jean.dupont@usine.fr"
        }),
        json!({
            "_id": "op-2",
            "prenom": "Élodie",
            "nom": "Martin",
            "role": "technicienne de maintenance",
            "email": "elodie.martin@usine.fr"
        }),
    ]
}

pub fn processus() -> Vec<Value> {
    vec![
        json!({
            "_id": "pr-1",
            "nom": "Emboutissage capot",
            "description": "Emboutissage à froid des capots",
            "dateDebut": "2024-03-01",
            "dateFin": "2024-03-15",
            "statut": "planifié",
            "etapes": [
                {
                    "numero": 1,
                    "nom": "Découpe des flans",
                    "dureeEstimee": 30,
                    "equipements": ["eq-1"],
                    "operateurs": ["op-1"],
                    "materiaux": ["mat-1"]
                },
                {
                    "numero": 2,
                    "nom": "Emboutissage",
                    "dureeEstimee": 45,
                    "equipements": ["eq-1"],
                    "operateurs": ["op-1", "op-2"]
                }
            ]
        }),
        json!({
            "_id": "pr-2",
            "nom": "Usinage de précision",
            "description": "Finition sur tour CNC",
            "statut": "en cours"
        }),
    ]
}
