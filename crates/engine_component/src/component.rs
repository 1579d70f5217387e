//! Core [`Component`] trait and the closed set of component kinds.
//!
//! A node carries at most one component of each [`ComponentKind`]. Payloads
//! are pure value data; there is no behaviour attached to them here.
//!
//! In scene files a component is written as an object tagged with its kind:
//!
//! ```json
//! { "type": "Collider2D", "extents": { "w": 16, "h": 17 } }
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    AnimatedSprite, Collider2D, ColorRect, Parallax, Script, Sprite, TextLabel, Transform2D,
};

/// Errors raised while assembling component sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// A second component of a kind already present was supplied.
    #[error("component '{0}' appears more than once")]
    DuplicateComponent(ComponentKind),

    /// A component kind name did not match any known kind.
    #[error("unknown component kind '{0}'")]
    UnknownKind(String),
}

/// Discriminant of [`ComponentData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform2D,
    Sprite,
    AnimatedSprite,
    Collider2D,
    TextLabel,
    ColorRect,
    Parallax,
    Script,
}

impl ComponentKind {
    /// Number of distinct kinds.
    pub const COUNT: usize = 8;

    /// Every kind, in storage order.
    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Transform2D,
        ComponentKind::Sprite,
        ComponentKind::AnimatedSprite,
        ComponentKind::Collider2D,
        ComponentKind::TextLabel,
        ComponentKind::ColorRect,
        ComponentKind::Parallax,
        ComponentKind::Script,
    ];

    /// Dense storage slot for this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform2D => "Transform2D",
            ComponentKind::Sprite => "Sprite",
            ComponentKind::AnimatedSprite => "AnimatedSprite",
            ComponentKind::Collider2D => "Collider2D",
            ComponentKind::TextLabel => "TextLabel",
            ComponentKind::ColorRect => "ColorRect",
            ComponentKind::Parallax => "Parallax",
            ComponentKind::Script => "Script",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ComponentError::UnknownKind(s.to_string()))
    }
}

/// A component payload tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentData {
    Transform2D(Transform2D),
    Sprite(Sprite),
    AnimatedSprite(AnimatedSprite),
    Collider2D(Collider2D),
    TextLabel(TextLabel),
    ColorRect(ColorRect),
    Parallax(Parallax),
    Script(Script),
}

impl ComponentData {
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentData::Transform2D(_) => ComponentKind::Transform2D,
            ComponentData::Sprite(_) => ComponentKind::Sprite,
            ComponentData::AnimatedSprite(_) => ComponentKind::AnimatedSprite,
            ComponentData::Collider2D(_) => ComponentKind::Collider2D,
            ComponentData::TextLabel(_) => ComponentKind::TextLabel,
            ComponentData::ColorRect(_) => ComponentKind::ColorRect,
            ComponentData::Parallax(_) => ComponentKind::Parallax,
            ComponentData::Script(_) => ComponentKind::Script,
        }
    }

    /// The default payload for `kind`.
    #[must_use]
    pub fn default_for(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Transform2D => Transform2D::default().into(),
            ComponentKind::Sprite => Sprite::default().into(),
            ComponentKind::AnimatedSprite => AnimatedSprite::default().into(),
            ComponentKind::Collider2D => Collider2D::default().into(),
            ComponentKind::TextLabel => TextLabel::default().into(),
            ComponentKind::ColorRect => ColorRect::default().into(),
            ComponentKind::Parallax => Parallax::default().into(),
            ComponentKind::Script => Script::default().into(),
        }
    }
}

/// Typed access to one [`ComponentData`] variant.
///
/// # Examples
///
/// ```rust
/// use engine_component::{Component, ComponentData, Transform2D};
///
/// let data: ComponentData = Transform2D::default().into();
/// assert!(Transform2D::from_data(&data).is_some());
/// ```
pub trait Component: Clone + Into<ComponentData> + 'static {
    /// The kind this payload is stored under.
    const KIND: ComponentKind;

    /// Borrow the payload if `data` holds this kind.
    fn from_data(data: &ComponentData) -> Option<&Self>;

    /// Mutably borrow the payload if `data` holds this kind.
    fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self>;
}

macro_rules! impl_component {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ComponentData {
                fn from(value: $ty) -> Self {
                    ComponentData::$ty(value)
                }
            }

            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_data(data: &ComponentData) -> Option<&Self> {
                    match data {
                        ComponentData::$ty(value) => Some(value),
                        _ => None,
                    }
                }

                fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self> {
                    match data {
                        ComponentData::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_component!(
    Transform2D,
    Sprite,
    AnimatedSprite,
    Collider2D,
    TextLabel,
    ColorRect,
    Parallax,
    Script,
);
