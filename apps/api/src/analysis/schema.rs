//! Schema Contract: the single declarative description of what the model must return.
//!
//! The same tree is rendered twice:
//! - `to_model_schema()` in Gemini's `responseSchema` dialect, sent with every request;
//! - `to_json_schema()` as standard JSON Schema, used to validate what comes back.

use std::sync::LazyLock;

use serde_json::{json, Map, Value};

use crate::models::analysis::{Nivel, PerfilInteres};

/// A node of the response contract.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Object {
        description: Option<&'static str>,
        properties: Vec<(&'static str, SchemaNode)>,
        required: Vec<&'static str>,
    },
    Array {
        description: Option<&'static str>,
        items: Box<SchemaNode>,
    },
    String {
        description: Option<&'static str>,
        allowed: Option<Vec<&'static str>>,
    },
    Number {
        description: Option<&'static str>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
}

impl SchemaNode {
    pub fn object(properties: Vec<(&'static str, SchemaNode)>, required: &[&'static str]) -> Self {
        SchemaNode::Object {
            description: None,
            properties,
            required: required.to_vec(),
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            description: None,
            items: Box::new(items),
        }
    }

    pub fn string() -> Self {
        SchemaNode::String {
            description: None,
            allowed: None,
        }
    }

    pub fn string_enum(allowed: &[&'static str]) -> Self {
        SchemaNode::String {
            description: None,
            allowed: Some(allowed.to_vec()),
        }
    }

    pub fn number_between(minimum: f64, maximum: f64) -> Self {
        SchemaNode::Number {
            description: None,
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    pub fn describe(mut self, text: &'static str) -> Self {
        match &mut self {
            SchemaNode::Object { description, .. }
            | SchemaNode::Array { description, .. }
            | SchemaNode::String { description, .. }
            | SchemaNode::Number { description, .. } => *description = Some(text),
        }
        self
    }

    fn description(&self) -> Option<&'static str> {
        match self {
            SchemaNode::Object { description, .. }
            | SchemaNode::Array { description, .. }
            | SchemaNode::String { description, .. }
            | SchemaNode::Number { description, .. } => *description,
        }
    }

    /// Renders the node in the dialect accepted by Gemini's `responseSchema`.
    /// Numeric bounds are left to the prompt and to response validation.
    pub fn to_model_schema(&self) -> Value {
        let mut out = Map::new();
        match self {
            SchemaNode::Object {
                properties,
                required,
                ..
            } => {
                out.insert("type".into(), json!("OBJECT"));
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, node)| (name.to_string(), node.to_model_schema()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
            }
            SchemaNode::Array { items, .. } => {
                out.insert("type".into(), json!("ARRAY"));
                out.insert("items".into(), items.to_model_schema());
            }
            SchemaNode::String { allowed, .. } => {
                out.insert("type".into(), json!("STRING"));
                if let Some(allowed) = allowed {
                    out.insert("enum".into(), json!(allowed));
                }
            }
            SchemaNode::Number { .. } => {
                out.insert("type".into(), json!("NUMBER"));
            }
        }
        if let Some(text) = self.description() {
            out.insert("description".into(), json!(text));
        }
        Value::Object(out)
    }

    /// Renders the node as standard JSON Schema for response validation.
    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaNode::Object {
                properties,
                required,
                ..
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, node)| (name.to_string(), node.to_json_schema()))
                    .collect();
                json!({ "type": "object", "properties": props, "required": required })
            }
            SchemaNode::Array { items, .. } => {
                json!({ "type": "array", "items": items.to_json_schema() })
            }
            SchemaNode::String { allowed, .. } => match allowed {
                Some(allowed) => json!({ "type": "string", "enum": allowed }),
                None => json!({ "type": "string" }),
            },
            SchemaNode::Number {
                minimum, maximum, ..
            } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("number"));
                if let Some(min) = minimum {
                    out.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    out.insert("maximum".into(), json!(max));
                }
                Value::Object(out)
            }
        }
    }
}

/// The analysis response contract.
pub static RESPONSE_SCHEMA: LazyLock<SchemaNode> = LazyLock::new(build_response_schema);

/// `RESPONSE_SCHEMA` in Gemini's dialect, rendered once.
pub static MODEL_SCHEMA: LazyLock<Value> = LazyLock::new(|| RESPONSE_SCHEMA.to_model_schema());

static VALIDATOR: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    jsonschema::validator_for(&RESPONSE_SCHEMA.to_json_schema())
        .expect("internal response schema to be valid")
});

/// Checks a parsed model response against the contract.
/// Returns every violation, one per line, if the response does not conform.
pub fn validate_response(instance: &Value) -> Result<(), String> {
    let errors: Vec<String> = VALIDATOR
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n"))
    }
}

fn build_response_schema() -> SchemaNode {
    let string_list = || SchemaNode::array(SchemaNode::string());
    let nivel_labels: Vec<&'static str> = Nivel::ALL.iter().map(Nivel::label).collect();
    let perfil_values: Vec<&'static str> = PerfilInteres::ALL.iter().map(|p| p.as_str()).collect();

    let feedback = SchemaNode::object(
        vec![
            (
                "strengths",
                string_list().describe("List of 3-5 positive aspects of the CV."),
            ),
            (
                "improvements",
                string_list().describe("List of 3-5 specific areas that need improvement."),
            ),
            (
                "actionPlan",
                string_list().describe(
                    "Concrete, actionable steps the user should take to fix the issues.",
                ),
            ),
            (
                "conclusion",
                SchemaNode::string().describe("A final encouraging summary paragraph."),
            ),
        ],
        &["strengths", "improvements", "actionPlan", "conclusion"],
    )
    .describe("Structured analysis of the CV.");

    let contact_info = SchemaNode::object(
        vec![
            ("email", SchemaNode::string()),
            ("phone", SchemaNode::string()),
            ("linkedin", SchemaNode::string()),
            ("location", SchemaNode::string()),
        ],
        &[],
    );

    let experience = SchemaNode::object(
        vec![
            ("role", SchemaNode::string()),
            ("company", SchemaNode::string()),
            ("dates", SchemaNode::string()),
            (
                "description",
                string_list()
                    .describe("Bullet points describing achievements, starting with action verbs."),
            ),
        ],
        &[],
    );

    let education = SchemaNode::object(
        vec![
            ("degree", SchemaNode::string()),
            ("institution", SchemaNode::string()),
            ("year", SchemaNode::string()),
        ],
        &[],
    );

    let cv_data = SchemaNode::object(
        vec![
            ("fullName", SchemaNode::string()),
            ("contactInfo", contact_info),
            (
                "professionalSummary",
                SchemaNode::string().describe("A strong, concise professional summary."),
            ),
            ("experience", SchemaNode::array(experience)),
            ("education", SchemaNode::array(education)),
            ("skills", string_list()),
            ("languages", string_list()),
        ],
        &["fullName", "experience", "education", "skills"],
    )
    .describe("Structured data extracted and optimized for ATS systems.");

    let tracking = SchemaNode::object(
        vec![
            (
                "perfilInteres",
                SchemaNode::string_enum(&perfil_values)
                    .describe("Nivel de interés del perfil: Alto, Medio o Bajo"),
            ),
            ("ciudad", SchemaNode::string().describe("Ciudad del candidato")),
            ("pais", SchemaNode::string().describe("País del candidato")),
            (
                "puestosAfines",
                string_list().describe("Lista de 3-5 puestos para los que este perfil sería ideal"),
            ),
        ],
        &["perfilInteres", "ciudad", "pais", "puestosAfines"],
    )
    .describe("Datos para tracking interno.");

    let ranking = SchemaNode::object(
        vec![
            (
                "score",
                SchemaNode::number_between(0.0, 100.0).describe(
                    "Puntaje de 0 a 100. Sé generoso: 40-55 es principiante, 56-65 en camino, \
                     66-75 competitivo, 76-85 destacado, 86+ excepcional. \
                     Incluso CVs básicos pueden tener 45-50.",
                ),
            ),
            (
                "nivel",
                SchemaNode::string_enum(&nivel_labels).describe("Nivel según score"),
            ),
            (
                "mensaje",
                SchemaNode::string().describe(
                    "Mensaje motivador personalizado explicando el score y qué hacer para subir de nivel.",
                ),
            ),
        ],
        &["score", "nivel", "mensaje"],
    )
    .describe("Sistema de ranking gamificado del CV.");

    SchemaNode::object(
        vec![
            ("feedback", feedback),
            ("cvData", cv_data),
            ("tracking", tracking),
            ("ranking", ranking),
        ],
        &["feedback", "cvData", "tracking", "ranking"],
    )
}
