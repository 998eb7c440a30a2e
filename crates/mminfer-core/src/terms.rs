// =============================================================================
// Model Terms and Specifications
// =============================================================================
//
// The data model for candidate generation:
//
//   - Term:           one named predictor effect, either a main effect or an
//                     interaction between main effects
//   - GlobalModel:    the maximal model under consideration (all terms, the
//                     response, the grouping variable, the family tag)
//   - CandidateModel: one subset of the global model's terms, produced by the
//                     enumerator
//
// MARGINALITY
// -----------
// An interaction term a:b only makes sense in a model that also contains the
// main effects a and b. Dropping a main effect while keeping its interaction
// re-parameterizes the model in a way that changes what the remaining
// coefficients mean. Enumeration therefore filters out such subsets by
// default (the policy is configurable on the enumerator).
//
// NAMING
// ------
// Interaction components are sorted alphabetically at construction and joined
// with ':' so that a:b and b:a are the same term everywhere: construction,
// lookup, display. The intercept is named "(Intercept)".
//
// =============================================================================

use crate::error::{MminferError, Result};

/// Name used for the intercept coefficient in every fitted model.
pub const INTERCEPT: &str = "(Intercept)";

// =============================================================================
// Family
// =============================================================================

/// Error-distribution / link tag for the response.
///
/// The core treats this as a label carried from the global model to the
/// fitter; the fitting backend supplies the actual variance and link
/// functions. Each tag implies its canonical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Continuous response, identity link.
    Gaussian,
    /// Count response, log link.
    Poisson,
    /// Binary response, logit link.
    Binomial,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Gaussian => "Gaussian",
            Family::Poisson => "Poisson",
            Family::Binomial => "Binomial",
        }
    }

    /// Name of the canonical link implied by the tag.
    pub fn link_name(&self) -> &'static str {
        match self {
            Family::Gaussian => "identity",
            Family::Poisson => "log",
            Family::Binomial => "logit",
        }
    }
}

// =============================================================================
// Term
// =============================================================================

/// A named predictor effect.
///
/// Either a single variable (main effect) or an interaction between two or
/// more main effects. Interaction components are stored sorted so the same
/// set of variables always produces the same term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Main(String),
    Interaction(Vec<String>),
}

impl Term {
    /// A main effect for one variable.
    pub fn main(name: impl Into<String>) -> Term {
        Term::Main(name.into())
    }

    /// An interaction between two or more variables.
    ///
    /// Components are sorted into canonical (alphabetical) order, so
    /// `interaction(["b", "a"])` and `interaction(["a", "b"])` are equal.
    pub fn interaction<I, S>(components: I) -> Term
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts: Vec<String> = components.into_iter().map(Into::into).collect();
        parts.sort();
        Term::Interaction(parts)
    }

    /// Display name: the variable itself, or components joined with ':'.
    pub fn name(&self) -> String {
        match self {
            Term::Main(v) => v.clone(),
            Term::Interaction(parts) => parts.join(":"),
        }
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self, Term::Interaction(_))
    }

    /// The main-effect variable names this term requires under marginality.
    ///
    /// Empty for a main effect (it requires nothing beyond itself); the
    /// component list for an interaction.
    pub fn required_mains(&self) -> &[String] {
        match self {
            Term::Main(_) => &[],
            Term::Interaction(parts) => parts,
        }
    }

    /// Every variable this term reads from the dataset.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Term::Main(v) => vec![v.as_str()],
            Term::Interaction(parts) => parts.iter().map(String::as_str).collect(),
        }
    }
}

// =============================================================================
// GlobalModel
// =============================================================================

/// The maximal model: every term under consideration, plus the response,
/// the optional random-effects grouping variable, and the family tag.
///
/// Immutable once built. Construct through [`GlobalModel::builder`], which
/// validates the term list (no duplicates, interactions at least two-way,
/// every interaction component present as a main effect).
#[derive(Debug, Clone)]
pub struct GlobalModel {
    response: String,
    terms: Vec<Term>,
    grouping: Option<String>,
    family: Family,
}

impl GlobalModel {
    pub fn builder(response: impl Into<String>, family: Family) -> GlobalModelBuilder {
        GlobalModelBuilder {
            response: response.into(),
            family,
            terms: Vec::new(),
            grouping: None,
        }
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    /// Terms in their canonical (construction) order. This ordering fixes
    /// the enumeration order of candidates.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// The random-effects grouping variable, if any. Treated as fixed
    /// structure: present in every candidate, never toggled by enumeration.
    pub fn grouping(&self) -> Option<&str> {
        self.grouping.as_deref()
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Does the term subset encoded in `mask` respect marginality?
    ///
    /// Bit i of the mask corresponds to `terms()[i]`. Valid when every
    /// included interaction has all of its component main effects included.
    pub fn mask_respects_marginality(&self, mask: u64) -> bool {
        for (i, term) in self.terms.iter().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            for component in term.required_mains() {
                let present = self.terms.iter().enumerate().any(|(j, t)| {
                    mask & (1 << j) != 0 && matches!(t, Term::Main(v) if v == component)
                });
                if !present {
                    return false;
                }
            }
        }
        true
    }
}

/// Builder for [`GlobalModel`]. Validation happens in [`build`].
///
/// [`build`]: GlobalModelBuilder::build
#[derive(Debug, Clone)]
pub struct GlobalModelBuilder {
    response: String,
    family: Family,
    terms: Vec<Term>,
    grouping: Option<String>,
}

impl GlobalModelBuilder {
    /// Add a main effect.
    pub fn main(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::main(name));
        self
    }

    /// Add an interaction between two or more variables.
    pub fn interaction<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms.push(Term::interaction(components));
        self
    }

    /// Add an already-constructed term.
    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Set the random-effects grouping variable.
    pub fn grouping(mut self, name: impl Into<String>) -> Self {
        self.grouping = Some(name.into());
        self
    }

    pub fn build(self) -> Result<GlobalModel> {
        if self.terms.is_empty() {
            return Err(MminferError::EmptyInput(
                "global model has no terms".to_string(),
            ));
        }

        // Duplicate terms would make presence masks ambiguous.
        for (i, a) in self.terms.iter().enumerate() {
            for b in self.terms.iter().skip(i + 1) {
                if a == b {
                    return Err(MminferError::InvalidValue(format!(
                        "duplicate term '{}' in global model",
                        a.name()
                    )));
                }
            }
        }

        for term in &self.terms {
            if let Term::Interaction(parts) = term {
                if parts.len() < 2 {
                    return Err(MminferError::InvalidValue(format!(
                        "interaction '{}' needs at least two components",
                        term.name()
                    )));
                }
                // Each component must be available as a main effect, or
                // marginality could never be satisfied for this term.
                for component in parts {
                    let found = self
                        .terms
                        .iter()
                        .any(|t| matches!(t, Term::Main(v) if v == component));
                    if !found {
                        return Err(MminferError::InvalidValue(format!(
                            "interaction '{}' references '{}', which is not a \
                             main effect of the global model",
                            term.name(),
                            component
                        )));
                    }
                }
            }
        }

        Ok(GlobalModel {
            response: self.response,
            terms: self.terms,
            grouping: self.grouping,
            family: self.family,
        })
    }
}

// =============================================================================
// CandidateModel
// =============================================================================

/// One reduced form of the global model.
///
/// Identified by which global terms are present (`mask`) and by its position
/// in enumeration order (`index`). Always implicitly contains the intercept
/// and the global model's grouping structure.
///
/// Candidates are created by the enumerator, handed to the fitter, and
/// discarded after scoring; only the score and coefficients live on in the
/// ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateModel {
    index: usize,
    mask: u64,
    terms: Vec<Term>,
}

impl CandidateModel {
    /// Assemble a candidate directly. Normally the enumerator does this;
    /// the constructor is public so externally fitted models can still be
    /// ranked through [`ModelRanking::from_fits`].
    ///
    /// [`ModelRanking::from_fits`]: crate::dredge::ModelRanking::from_fits
    pub fn new(index: usize, mask: u64, terms: Vec<Term>) -> CandidateModel {
        CandidateModel { index, mask, terms }
    }

    /// Position in enumeration order. Used as the ordering key when fits
    /// complete out of order, and as context in error reports.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Presence bitmask over the global model's term ordering.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// The included terms, in global-model order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn contains(&self, term_name: &str) -> bool {
        self.terms.iter().any(|t| t.name() == term_name)
    }

    /// Human-readable formula, e.g. `count ~ 1 + treatment + landuse`.
    pub fn formula(&self, global: &GlobalModel) -> String {
        let mut rhs = String::from("1");
        for term in &self.terms {
            rhs.push_str(" + ");
            rhs.push_str(&term.name());
        }
        if let Some(group) = global.grouping() {
            rhs.push_str(&format!(" + (1 | {})", group));
        }
        format!("{} ~ {}", global.response(), rhs)
    }
}

// =============================================================================
// Tests
// =============================================================================
