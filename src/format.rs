use serde::{Deserialize, Serialize};

/// Reference from a [`Format`] to an interned component record.
///
/// `applied` mirrors the stylesheet convention that a component can be bound
/// for inheritance without being switched on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentBinding {
    /// Index into the component's interning table.
    pub id: u32,
    /// Whether the component takes effect on cells using this format.
    pub applied: bool,
}

impl ComponentBinding {
    pub const fn applied(id: u32) -> Self {
        Self { id, applied: true }
    }
}

/// A composite formatting record.
///
/// Formats are immutable value records interned by the stylesheet: two
/// formats are equal exactly when every component id, every applied flag, and
/// the style name match. "Setting" a component goes through the stylesheet's
/// copy-on-write setters, which return a (possibly re-interned) format id and
/// never mutate a record other holders can see.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Format {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<ComponentBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<ComponentBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<ComponentBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<ComponentBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<ComponentBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<ComponentBinding>,
    /// Name of the style template this format belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Format {
    /// Returns true if no component is bound and no style name is attached.
    pub fn is_empty(&self) -> bool {
        self.alignment.is_none()
            && self.border.is_none()
            && self.fill.is_none()
            && self.font.is_none()
            && self.number_format.is_none()
            && self.protection.is_none()
            && self.style.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Format {
            font: Some(ComponentBinding::applied(3)),
            number_format: Some(ComponentBinding { id: 1, applied: false }),
            ..Default::default()
        };
        let mut b = Format::default();
        b.number_format = Some(ComponentBinding { id: 1, applied: false });
        b.font = Some(ComponentBinding::applied(3));
        assert_eq!(a, b);

        b.font = Some(ComponentBinding { id: 3, applied: false });
        assert_ne!(a, b, "applied flags take part in equality");

        b.font = Some(ComponentBinding::applied(3));
        b.style = Some("Heading".to_string());
        assert_ne!(a, b, "style name takes part in equality");
    }
}
