use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Location {
    #[serde(rename = "F1")]
    Floor1,
    #[serde(rename = "F2")]
    Floor2,
    #[serde(rename = "F3")]
    Floor3,
    #[serde(rename = "F4")]
    Floor4,
    #[serde(rename = "EW")]
    EastWing,
    #[serde(rename = "WW")]
    WestWing,
    #[serde(rename = "LB")]
    Lobby,
    #[serde(rename = "EXT")]
    Exterior,
}

/// How a location is reached, which decides what a rescue there needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Ladder held by Fire plus an ambulance on site.
    HighFloor,
    /// An ambulance on site.
    Ground,
    /// An ambulance on site and a clear evacuation route.
    Exterior,
    /// Nothing can reach victims here.
    Unreachable,
}

impl Location {
    pub const ALL: [Location; 8] = [
        Location::Floor1,
        Location::Floor2,
        Location::Floor3,
        Location::Floor4,
        Location::EastWing,
        Location::WestWing,
        Location::Lobby,
        Location::Exterior,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Location::Floor1 => "F1",
            Location::Floor2 => "F2",
            Location::Floor3 => "F3",
            Location::Floor4 => "F4",
            Location::EastWing => "EW",
            Location::WestWing => "WW",
            Location::Lobby => "LB",
            Location::Exterior => "EXT",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Location::Floor3 | Location::Floor4 => Access::HighFloor,
            Location::Floor1 | Location::Floor2 | Location::Lobby => Access::Ground,
            Location::Exterior => Access::Exterior,
            Location::EastWing | Location::WestWing => Access::Unreachable,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wings_are_unreachable() {
        assert_eq!(Location::EastWing.access(), Access::Unreachable);
        assert_eq!(Location::WestWing.access(), Access::Unreachable);
        assert_eq!(Location::Lobby.access(), Access::Ground);
        assert_eq!(Location::Floor4.access(), Access::HighFloor);
    }

    #[test]
    fn serializes_as_site_code() {
        let json = serde_json::to_string(&Location::Exterior).unwrap();
        assert_eq!(json, "\"EXT\"");
        let back: Location = serde_json::from_str("\"F3\"").unwrap();
        assert_eq!(back, Location::Floor3);
    }
}
