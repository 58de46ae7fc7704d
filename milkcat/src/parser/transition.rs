use crate::errors::{MilkcatError, Result};
use crate::model::MaxentModel;

/// Transition of the arc-eager system.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Transition {
    /// Moves the front of the buffer onto the stack.
    Shift,
    /// Pops the stack top, which must already have a head.
    Reduce,
    /// Attaches the stack top to the front of the buffer with the label,
    /// then pops the stack.
    LeftArc(u16),
    /// Attaches the front of the buffer to the stack top with the label,
    /// then pushes it onto the stack.
    RightArc(u16),
}

/// Mapping from the classifier's label ids to transitions, built once so
/// that no label names are compared while parsing.
pub struct TransitionTable {
    transitions: Vec<Transition>,
    labels: Vec<String>,
}

impl TransitionTable {
    /// Decodes the labels of `classifier`. A label starting with `SHIF`
    /// is [`Transition::Shift`], `REDU` is [`Transition::Reduce`], and
    /// `LARC_<l>` and `RARC_<l>` are arcs labeled `l`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a label is not a transition, or
    /// when the labels miss one of the four kinds.
    pub fn new(classifier: &MaxentModel) -> Result<Self> {
        let mut table = Self {
            transitions: Vec::with_capacity(classifier.ysize()),
            labels: vec![],
        };
        let mut seen = [false; 4];
        for label_id in 0..classifier.ysize() {
            let name = classifier.yname(label_id);
            let transition = if name.starts_with("SHIF") {
                seen[0] = true;
                Transition::Shift
            } else if name.starts_with("REDU") {
                seen[1] = true;
                Transition::Reduce
            } else if let Some(label) = name.strip_prefix("LARC_") {
                seen[2] = true;
                Transition::LeftArc(table.intern(label)?)
            } else if let Some(label) = name.strip_prefix("RARC_") {
                seen[3] = true;
                Transition::RightArc(table.intern(label)?)
            } else {
                return Err(MilkcatError::invalid_format(
                    "classifier",
                    format!("unknown transition label: {name}"),
                ));
            };
            table.transitions.push(transition);
        }
        if seen.contains(&false) {
            return Err(MilkcatError::invalid_format(
                "classifier",
                "labels must cover SHIFT, REDUCE, LARC_* and RARC_*",
            ));
        }
        Ok(table)
    }

    /// Gets the id of a dependency label, registering it if new.
    pub fn intern(&mut self, label: &str) -> Result<u16> {
        if let Some(id) = self.label_id(label) {
            return Ok(id);
        }
        let id = u16::try_from(self.labels.len())?;
        self.labels.push(label.to_string());
        Ok(id)
    }

    #[inline(always)]
    pub fn label_id(&self, label: &str) -> Option<u16> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|id| id as u16)
    }

    #[inline(always)]
    pub fn label(&self, id: u16) -> &str {
        &self.labels[usize::from(id)]
    }

    #[inline(always)]
    pub fn transition(&self, label_id: usize) -> Transition {
        self.transitions[label_id]
    }
}
