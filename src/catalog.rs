//! The fixed drop-down options and the prompt built from them.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Occasions a greeting can be written for.
pub const OCCASIONS: [&str; 14] = [
    "New Year's Day",
    "Valentine's Day",
    "Holi",
    "Easter",
    "Mother's Day",
    "Father's Day",
    "Independence Day",
    "Christmas",
    "Dussehra",
    "Diwali",
    "Ramzan",
    "Onam",
    "Vishu",
    "Birthday",
];

/// Tones the generated message can take.
pub const TONES: [&str; 5] = ["Professional", "Heartfelt", "Fun", "Traditional", "Poetic"];

const PROFESSIONAL_ROLES: [&str; 5] = ["Manager", "Coworker", "Client", "Mentor", "Senior Leader"];
const FRIEND_ROLES: [&str; 2] = ["Close Friend", "Acquaintance"];
const FAMILY_ROLES: [&str; 6] = [
    "Parent",
    "Sibling",
    "Spouse/Partner",
    "Child",
    "Grandparent",
    "Other Relative",
];

static HEX_COLOR: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$"));

/// Occasions in the order they are offered, alphabetical.
pub fn sorted_occasions() -> Vec<&'static str> {
    let mut occasions = OCCASIONS.to_vec();
    occasions.sort_unstable();
    occasions
}

/// Tones in the order they are offered, alphabetical.
pub fn sorted_tones() -> Vec<&'static str> {
    let mut tones = TONES.to_vec();
    tones.sort_unstable();
    tones
}

/// Returns true when `occasion` is one of [`OCCASIONS`].
pub fn is_known_occasion(occasion: &str) -> bool {
    OCCASIONS.contains(&occasion)
}

/// Returns true when `tone` is one of [`TONES`].
pub fn is_known_tone(tone: &str) -> bool {
    TONES.contains(&tone)
}

/// Top-level relationship grouping, which decides the valid specific roles.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RelationshipCategory {
    /// Work relationships
    #[default]
    Professional,
    /// Friends
    Friend,
    /// Family members
    Family,
}

impl RelationshipCategory {
    /// Every category, in display order.
    pub const ALL: [RelationshipCategory; 3] = [Self::Professional, Self::Friend, Self::Family];

    /// The label used in the prompt and the drop-down.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Friend => "Friend",
            Self::Family => "Family",
        }
    }

    /// Label for the dependent specific-role drop-down.
    pub fn role_label(self) -> &'static str {
        match self {
            Self::Professional => "Select professional role",
            Self::Friend => "Select friend type",
            Self::Family => "Select family member",
        }
    }

    /// The specific roles valid for this category.
    pub fn sub_roles(self) -> &'static [&'static str] {
        resolve_sub_roles(self)
    }
}

impl fmt::Display for RelationshipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string doesn't name a [`RelationshipCategory`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relationship category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for RelationshipCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// Maps a category to its ordered list of specific roles.
pub fn resolve_sub_roles(category: RelationshipCategory) -> &'static [&'static str] {
    match category {
        RelationshipCategory::Professional => &PROFESSIONAL_ROLES,
        RelationshipCategory::Friend => &FRIEND_ROLES,
        RelationshipCategory::Family => &FAMILY_ROLES,
    }
}

/// Builds the text-generation prompt. Inputs come from closed lists so nothing is escaped.
pub fn build_prompt(
    tone: &str,
    specific_relationship: &str,
    relationship_category: RelationshipCategory,
    occasion: &str,
) -> String {
    format!(
        "Give me a short greeting message in a {tone} tone for {specific_relationship} in the context of {relationship_category} for {occasion}"
    )
}

/// An RGB colour picked in the form, written as `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextColor {
    /// Red
    pub red: u8,
    /// Green
    pub green: u8,
    /// Blue
    pub blue: u8,
}

impl TextColor {
    /// Builds a colour from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The channels as an `[r, g, b]` array.
    pub fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Returned when a colour isn't in `#rrggbb` form.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidColor(pub String);

impl fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid colour, expected #rrggbb: {}", self.0)
    }
}

impl std::error::Error for InvalidColor {}

impl FromStr for TextColor {
    type Err = InvalidColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidColor(value.to_string());
        let regex = HEX_COLOR.as_ref().map_err(|_| invalid())?;
        let captures = regex.captures(value.trim()).ok_or_else(invalid)?;
        let mut channels = [0u8; 3];
        for (slot, index) in channels.iter_mut().zip(1..=3) {
            let hex = captures.get(index).ok_or_else(invalid)?.as_str();
            *slot = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
        }
        let [red, green, blue] = channels;
        Ok(Self::new(red, green, blue))
    }
}

impl TryFrom<String> for TextColor {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextColor> for String {
    fn from(color: TextColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Everything picked in the form that feeds the prompt and the render.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// One of [`OCCASIONS`]
    pub occasion: String,
    /// One of [`TONES`]
    pub tone: String,
    /// Top-level relationship
    pub category: RelationshipCategory,
    /// Drawn from the category's sub-roles
    pub specific_relationship: String,
    /// Colour of the greeting text on the image
    pub text_color: TextColor,
}

impl Default for Selection {
    fn default() -> Self {
        let category = RelationshipCategory::default();
        Self {
            occasion: sorted_occasions()
                .first()
                .copied()
                .unwrap_or_default()
                .to_string(),
            tone: sorted_tones().first().copied().unwrap_or_default().to_string(),
            category,
            specific_relationship: category
                .sub_roles()
                .first()
                .copied()
                .unwrap_or_default()
                .to_string(),
            text_color: TextColor::default(),
        }
    }
}

impl Selection {
    /// The prompt for this selection.
    pub fn prompt(&self) -> String {
        build_prompt(
            &self.tone,
            &self.specific_relationship,
            self.category,
            &self.occasion,
        )
    }
}
