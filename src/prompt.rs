//! Deterministic prompt construction.
//!
//! Identical inputs always render identical prompts: no timestamps, no
//! randomness, no map iteration. Prompts are written in Chilean Spanish.

use crate::models::{Grade, MinistryStandard};

/// Answer style requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Explanation,
    Summary,
    Example,
    /// Any unrecognized style name.
    Generic,
}

impl Style {
    /// `None` maps to [`Style::Explanation`]; unknown names to [`Style::Generic`].
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some("explanation") => Self::Explanation,
            Some("summary") => Self::Summary,
            Some("example") => Self::Example,
            Some(_) => Self::Generic,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Explanation => {
                "Proporciona una explicación detallada y clara, paso a paso."
            }
            Self::Summary => "Proporciona un resumen conciso de los conceptos clave.",
            Self::Example => {
                "Proporciona ejemplos prácticos usando pesos chilenos (CLP), nombres chilenos y lugares de Chile."
            }
            Self::Generic => "Responde de manera educativa y adecuada al nivel del estudiante.",
        }
    }
}

/// Inputs to [`build_generation_prompt`].
pub struct GenerationPrompt<'a> {
    pub context: &'a str,
    pub query: &'a str,
    pub grade: Grade,
    pub subject: &'a str,
    pub oa_codes: &'a [String],
    pub style: Style,
}

pub fn build_generation_prompt(p: &GenerationPrompt<'_>) -> String {
    let grade_label = p.grade.localized();
    let mut out = String::new();

    out.push_str(&format!(
        "Eres un tutor educativo chileno experto en {} para estudiantes de {}.\n",
        p.subject, grade_label
    ));
    if !p.oa_codes.is_empty() {
        out.push_str(&format!(
            "Considera los siguientes Objetivos de Aprendizaje (OA): {}.\n",
            p.oa_codes.join(", ")
        ));
    }

    out.push_str("\nContexto curricular:\n");
    out.push_str(p.context);
    out.push_str("\n\nPregunta del estudiante:\n");
    out.push_str(p.query);

    out.push_str("\n\nInstrucciones:\n");
    out.push_str(&format!("- {}\n", p.style.instruction()));
    out.push_str(&format!(
        "- Usa español de Chile y un lenguaje apropiado para {}.\n",
        grade_label
    ));
    out.push_str("- Usa nombres, lugares y referencias propias de Chile.\n");
    out.push_str(
        "- Usa terminología alineada con las Bases Curriculares del Ministerio de Educación de Chile (MINEDUC).\n",
    );
    out.push_str("- Basa tu respuesta en el contexto curricular entregado.\n");
    out.push_str("\nRespuesta:\n");
    out
}

/// Labels the rubric response must use, in order.
pub const RUBRIC_LABELS: [&str; 6] = [
    "OA_SCORE",
    "GRADE_SCORE",
    "CHILEAN_SCORE",
    "COVERAGE_SCORE",
    "ISSUES",
    "RECOMMENDATIONS",
];

pub fn build_rubric_prompt(
    content: &str,
    grade: Grade,
    subject: &str,
    expected_oa: &[String],
    standards: &[MinistryStandard],
) -> String {
    let grade_label = grade.localized();
    let mut out = String::new();

    out.push_str("Eres un evaluador experto del currículum nacional de Chile (MINEDUC).\n");
    out.push_str(&format!(
        "Evalúa el siguiente contenido educativo para {} en la asignatura de {}.\n",
        grade_label, subject
    ));
    out.push_str("\nContenido:\n");
    out.push_str(content);
    out.push('\n');

    out.push_str("\nObjetivos de Aprendizaje esperados:\n");
    if expected_oa.is_empty() {
        out.push_str("- (no se especificaron OA; evalúa según las Bases Curriculares del nivel)\n");
    } else {
        for code in expected_oa {
            match standards.iter().find(|s| &s.oa_code == code) {
                Some(standard) => {
                    out.push_str(&format!("- {}: {}\n", code, standard.description))
                }
                None => out.push_str(&format!("- {}\n", code)),
            }
        }
    }

    out.push_str("\nAsigna un puntaje de 0 a 100 a cada criterio:\n");
    out.push_str("1. Alineación con los Objetivos de Aprendizaje esperados.\n");
    out.push_str(&format!("2. Adecuación al nivel {}.\n", grade_label));
    out.push_str("3. Uso de terminología y contexto chileno.\n");
    out.push_str("4. Cobertura de los objetivos de aprendizaje.\n");

    out.push_str("\nResponde exactamente con este formato:\n");
    out.push_str("OA_SCORE: <número>\n");
    out.push_str("GRADE_SCORE: <número>\n");
    out.push_str("CHILEAN_SCORE: <número>\n");
    out.push_str("COVERAGE_SCORE: <número>\n");
    out.push_str("ISSUES: <problemas separados por comas, o \"ninguno\">\n");
    out.push_str("RECOMMENDATIONS: <recomendaciones separadas por comas, o \"ninguno\">\n");
    out
}
