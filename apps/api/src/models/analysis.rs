use serde::{Deserialize, Serialize};

/// Full structured output of a CV analysis. Field names match the JSON contract
/// shared with the model and the front-end (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub feedback: Feedback,
    pub cv_data: CvData,
    pub tracking: Tracking,
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub action_plan: Vec<String>,
    pub conclusion: String,
}

/// ATS-optimized rewrite of the CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvData {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_summary: Option<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// Item fields are not required by the schema, so missing ones default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub dates: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

/// Internal tracking data about the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub perfil_interes: PerfilInteres,
    pub ciudad: String,
    pub pais: String,
    pub puestos_afines: Vec<String>,
}

/// How interesting the profile is for recruiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerfilInteres {
    Alto,
    Medio,
    Bajo,
}

impl PerfilInteres {
    pub const ALL: [PerfilInteres; 3] = [PerfilInteres::Alto, PerfilInteres::Medio, PerfilInteres::Bajo];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerfilInteres::Alto => "Alto",
            PerfilInteres::Medio => "Medio",
            PerfilInteres::Bajo => "Bajo",
        }
    }
}

/// Gamified score shown to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// 0 – 100
    pub score: f64,
    pub nivel: Nivel,
    pub mensaje: String,
}

impl Ranking {
    /// Aligns `nivel` with the band of `score`. Returns true if it had to be changed.
    pub fn reconcile_nivel(&mut self) -> bool {
        let expected = Nivel::for_score(self.score);
        if self.nivel == expected {
            return false;
        }
        self.nivel = expected;
        true
    }
}

/// Score band. Serialized with the exact labels the front-end displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nivel {
    #[serde(rename = "🌟 Principiante")]
    Principiante,
    #[serde(rename = "⭐ En Camino")]
    EnCamino,
    #[serde(rename = "✨ Competitivo")]
    Competitivo,
    #[serde(rename = "🚀 Destacado")]
    Destacado,
    #[serde(rename = "💎 Excepcional")]
    Excepcional,
}

impl Nivel {
    pub const ALL: [Nivel; 5] = [
        Nivel::Principiante,
        Nivel::EnCamino,
        Nivel::Competitivo,
        Nivel::Destacado,
        Nivel::Excepcional,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Nivel::Principiante => "🌟 Principiante",
            Nivel::EnCamino => "⭐ En Camino",
            Nivel::Competitivo => "✨ Competitivo",
            Nivel::Destacado => "🚀 Destacado",
            Nivel::Excepcional => "💎 Excepcional",
        }
    }

    /// Bands: ..56 Principiante, 56..66 En Camino, 66..76 Competitivo,
    /// 76..86 Destacado, 86.. Excepcional.
    pub fn for_score(score: f64) -> Self {
        if score < 56.0 {
            Nivel::Principiante
        } else if score < 66.0 {
            Nivel::EnCamino
        } else if score < 76.0 {
            Nivel::Competitivo
        } else if score < 86.0 {
            Nivel::Destacado
        } else {
            Nivel::Excepcional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nivel_bands() {
        assert_eq!(Nivel::for_score(40.0), Nivel::Principiante);
        assert_eq!(Nivel::for_score(55.0), Nivel::Principiante);
        assert_eq!(Nivel::for_score(56.0), Nivel::EnCamino);
        assert_eq!(Nivel::for_score(65.9), Nivel::EnCamino);
        assert_eq!(Nivel::for_score(70.0), Nivel::Competitivo);
        assert_eq!(Nivel::for_score(76.0), Nivel::Destacado);
        assert_eq!(Nivel::for_score(86.0), Nivel::Excepcional);
        assert_eq!(Nivel::for_score(100.0), Nivel::Excepcional);
    }

    #[test]
    fn test_nivel_serializes_with_display_label() {
        for nivel in Nivel::ALL {
            let json = serde_json::to_string(&nivel).unwrap();
            assert_eq!(json, format!("\"{}\"", nivel.label()));
        }
        let parsed: Nivel = serde_json::from_str(r#""✨ Competitivo""#).unwrap();
        assert_eq!(parsed, Nivel::Competitivo);
    }

    #[test]
    fn test_reconcile_nivel_corrects_mismatch() {
        let mut ranking = Ranking {
            score: 70.0,
            nivel: Nivel::Excepcional,
            mensaje: "Buen trabajo".to_string(),
        };
        assert!(ranking.reconcile_nivel());
        assert_eq!(ranking.nivel, Nivel::Competitivo);
        assert!(!ranking.reconcile_nivel());
    }

    #[test]
    fn test_cv_data_optional_fields_absent() {
        let json = r#"{
            "fullName": "Ana Pérez",
            "experience": [{"role": "Analista", "company": "Acme"}],
            "education": [],
            "skills": ["SQL"]
        }"#;
        let cv: CvData = serde_json::from_str(json).unwrap();
        assert_eq!(cv.full_name, "Ana Pérez");
        assert!(cv.contact_info.is_none());
        assert!(cv.languages.is_none());
        assert_eq!(cv.experience[0].dates, "");
        assert!(cv.experience[0].description.is_empty());

        let back = serde_json::to_value(&cv).unwrap();
        assert!(back.get("contactInfo").is_none());
        assert!(back.get("professionalSummary").is_none());
    }

    #[test]
    fn test_perfil_interes_rejects_unknown_value() {
        assert!(serde_json::from_str::<PerfilInteres>(r#""Altísimo""#).is_err());
        for perfil in PerfilInteres::ALL {
            let json = serde_json::to_string(&perfil).unwrap();
            assert_eq!(json, format!("\"{}\"", perfil.as_str()));
        }
    }
}
