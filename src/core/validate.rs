use crate::core::normalize::normalize;
use crate::domain::model::{ValidationOutcome, ValidationStatus};
use crate::domain::ports::RegistryStore;
use crate::utils::error::{RegistryError, Result};

/// One reply text per validation status. The `{serial}` placeholder carries
/// the user's original input; the `OK` template additionally takes
/// `{reference}`, `{description}` and `{date}` from the matched range.
///
/// Template content is presentation, not contract; the defaults mirror the
/// legacy reply wording.
#[derive(Debug, Clone)]
pub struct AnswerTemplates {
    pub ok: String,
    pub failure: String,
    pub double: String,
    pub not_found: String,
}

impl Default for AnswerTemplates {
    fn default() -> Self {
        AnswerTemplates {
            ok: "{serial}\n{reference}\n{description}\nHologram date: {date}\nGenuine product.\nFor anything else please contact the sales support desk.".to_string(),
            failure: "{serial}\nThis hologram number could not be validated. Please try again or contact the support desk.\nA valid hologram number is two English letters followed by 7 or 8 digits, for example:\nFA1234567".to_string(),
            double: "{serial}\nThis hologram number is confirmed.\nFor details of the product please contact the sales support desk.".to_string(),
            not_found: "{serial}\nThis hologram number was not found. Please try again or contact the support desk.\nA valid hologram number is two English letters followed by 7 or 8 digits, for example:\nFA1234567".to_string(),
        }
    }
}

/// Query-time classification of one raw serial against the registry.
///
/// Holds no mutable state of its own; it is safe to share across concurrent
/// callers as long as the store is.
pub struct ValidationEngine<S> {
    store: S,
    width: usize,
    templates: AnswerTemplates,
}

impl<S: RegistryStore> ValidationEngine<S> {
    pub fn new(store: S, width: usize) -> Self {
        ValidationEngine {
            store,
            width,
            templates: AnswerTemplates::default(),
        }
    }

    pub fn with_templates(mut self, templates: AnswerTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Classifies `raw` and renders the reply.
    ///
    /// The invalid list is consulted before range lookup, so a denylisted
    /// serial inside a covering range still comes back `FAILURE`. Errors
    /// escaping this method are storage failures only; a serial that cannot
    /// be normalized resolves to `FAILURE` rather than an error.
    pub async fn validate(&self, raw: &str) -> Result<ValidationOutcome> {
        let canonical = match normalize(raw, self.width) {
            Ok(canonical) => canonical,
            Err(RegistryError::SerialOverflow { .. }) => {
                tracing::debug!("serial '{raw}' does not normalize at width {}", self.width);
                return Ok(ValidationOutcome {
                    status: ValidationStatus::Failure,
                    matched: None,
                    answer: self.templates.failure.replace("{serial}", raw),
                });
            }
            Err(e) => return Err(e),
        };

        if self.store.is_invalid(&canonical).await? {
            return Ok(ValidationOutcome {
                status: ValidationStatus::Failure,
                matched: None,
                answer: self.templates.failure.replace("{serial}", raw),
            });
        }

        let mut matches = self.store.find_ranges(&canonical).await?;
        match matches.len() {
            0 => Ok(ValidationOutcome {
                status: ValidationStatus::NotFound,
                matched: None,
                answer: self.templates.not_found.replace("{serial}", raw),
            }),
            1 => {
                let range = matches.remove(0);
                let answer = self
                    .templates
                    .ok
                    .replace("{serial}", raw)
                    .replace("{reference}", &range.reference)
                    .replace("{description}", &range.description)
                    .replace("{date}", &range.effective_date.format("%Y-%m-%d").to_string());
                Ok(ValidationOutcome {
                    status: ValidationStatus::Ok,
                    matched: Some(range),
                    answer,
                })
            }
            found => {
                tracing::warn!("serial '{canonical}' matches {found} ranges");
                Ok(ValidationOutcome {
                    status: ValidationStatus::Double,
                    matched: None,
                    answer: self.templates.double.replace("{serial}", raw),
                })
            }
        }
    }
}
