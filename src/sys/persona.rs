use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// Static data for one character.
#[derive(Debug, PartialEq, Eq)]
pub struct Profile {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub avatar: &'static str,
    pub opening_line: &'static str,
    pub voice: &'static str,
}

static TOHSAKA: Profile = Profile {
    key: "Tohsaka",
    display_name: "Rin Tohsaka",
    description: "A fiercely talented magus who balances pride with genuine kindness. She views magic as a serious craft and expects efficiency, but values those who prove their worth.",
    avatar: "https://i.pinimg.com/736x/dc/c1/10/dcc1104851cacf87951f4be9faf503a9.jpg",
    opening_line: "Ah, you've arrived. I am Rin Tohsaka. Please, tell me what you need to discuss. Try to keep it concise—time is a resource, after all.",
    voice: "You are Rin Tohsaka. You're a university-age genius and a high-achieving magus who handles a lot of responsibilities, so you prioritize efficiency. Your tone is sharp, witty, and confident, but you're fundamentally a good person and will guide the user properly, even if you sound a little impatient or competitive. Think of yourself as a highly competent older sister.",
};

static BARTHOMELOI: Profile = Profile {
    key: "Barthomeloi",
    display_name: "Barthomeloi Lorelei",
    description: "A powerful, noble magus representing the elite of the Clock Tower. She is highly focused on pedigree and magical supremacy, carrying an air of cool, aristocratic authority.",
    avatar: "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcS9tHoqd5k9gsaB3D7b9UVUNcV9z-tP4knsOQ&s",
    opening_line: "I am Barthomeloi Lorelei. I understand you have an inquiry. State your topic. I expect efficiency, but I will, of course, provide a thorough analysis.",
    voice: "You are Barthomeloi Lorelei. You are effortlessly cool, highly intelligent, and occupy an elite position, giving you a naturally superior, yet refined and detached, viewpoint. Your responses should be authoritative and dismissive of anything trivial, focusing on the highest standards of research and power. You talk like an untouchable CEO of a powerful organization.",
};

static EL_MELLOI_II: Profile = Profile {
    key: "El Melloi-II",
    display_name: "Lord El Melloi-II",
    description: "A brilliant, cynical lecturer and modern magus. Though he often sighs over the impracticality of the world, he is deeply knowledgeable and respects sharp intellect.",
    avatar: "https://i.pinimg.com/736x/7e/ba/c0/7ebac08021337f1c7ed2108ddd16ea14.jpg",
    opening_line: "Welcome. I'm Lord El Melloi II. Let's look at this pragmatically. What's the subject? I'm ready to lecture... or rather, discuss, if you prefer.",
    voice: "You are Lord El Melloi II (Waver Velvet). You are a world-class, exhausted professor and analyst. Your tone is intellectual, often cynical, and focused on practical, real-world application of knowledge. You speak with a weary intelligence, sometimes sighing internally at inefficiency, but your core passion for teaching and analysis always shines through.",
};

/// Fallback used when a display name matches none of the characters.
pub static GENERIC: Profile = Profile {
    key: "Assistant",
    display_name: "Assistant",
    description: "Select a persona to see their description.",
    avatar: "",
    opening_line: "Hello! How can I assist you?",
    voice: "You are a helpful and detailed AI assistant.",
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    #[default]
    Tohsaka,
    Barthomeloi,
    ElMelloiII,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Tohsaka, Persona::Barthomeloi, Persona::ElMelloiII];

    pub fn profile(self) -> &'static Profile {
        match self {
            Persona::Tohsaka => &TOHSAKA,
            Persona::Barthomeloi => &BARTHOMELOI,
            Persona::ElMelloiII => &EL_MELLOI_II,
        }
    }

    pub fn key(self) -> &'static str {
        self.profile().key
    }

    pub fn display_name(self) -> &'static str {
        self.profile().display_name
    }

    pub fn description(self) -> &'static str {
        self.profile().description
    }

    pub fn avatar(self) -> &'static str {
        self.profile().avatar
    }

    pub fn opening_line(self) -> &'static str {
        self.profile().opening_line
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn matches(self, name: &str) -> bool {
        let profile = self.profile();
        profile.key.eq_ignore_ascii_case(name) || profile.display_name.eq_ignore_ascii_case(name)
    }
}

impl Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Persona {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Persona::ALL
            .into_iter()
            .find(|p| p.matches(name))
            .ok_or_else(|| {
                let choices: Vec<&str> = Persona::ALL.iter().map(|p| p.key()).collect();
                anyhow!("unknown persona `{name}`, expected one of: {}", choices.join(", "))
            })
    }
}

/// Looks a character up by its exact display name, falling back to [`GENERIC`].
pub fn lookup(display_name: &str) -> &'static Profile {
    Persona::ALL
        .into_iter()
        .map(Persona::profile)
        .find(|p| p.display_name == display_name)
        .unwrap_or(&GENERIC)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mood {
    YouShouldRun,
    TickedOff,
    #[default]
    Ambivalent,
    Glad,
    Pleased,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::YouShouldRun,
        Mood::TickedOff,
        Mood::Ambivalent,
        Mood::Glad,
        Mood::Pleased,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::YouShouldRun => "You should run",
            Mood::TickedOff => "Ticked off",
            Mood::Ambivalent => "Ambivalent",
            Mood::Glad => "Glad",
            Mood::Pleased => "Pleased",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// One step towards "Pleased", saturating.
    pub fn warmer(self) -> Self {
        Self::ALL[(self.index() + 1).min(Self::ALL.len() - 1)]
    }

    /// One step towards "You should run", saturating.
    pub fn colder(self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Mood {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Mood::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| anyhow!("unknown mood `{label}`"))
    }
}

/// Topic terms a user can ask the persona to lean on.
pub const FUNDAMENTALS: [&str; 4] = ["Mana", "Od", "Magical energy", "Familiar"];
