//! Static per-body descriptors: display colors, sizes, orbit radii, and
//! the naming conventions tying bodies to the position JSON and to the
//! per-body texture assets.

use eframe::egui::Color32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Moon,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }

    /// Key used for this body in the position document.
    pub fn data_key(&self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Earth => "earth",
            Body::Moon => "moon",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
        }
    }

    pub fn from_key(key: &str) -> Option<Body> {
        Body::ALL.iter().copied().find(|b| b.data_key() == key)
    }

    /// Flat color used for orbit rings and for the fallback sphere when the
    /// texture asset is missing.
    pub fn display_color(&self) -> Color32 {
        match self {
            Body::Sun => Color32::from_rgb(0xff, 0xff, 0x00),
            Body::Mercury => Color32::from_rgb(0x8c, 0x8c, 0x8c),
            Body::Venus => Color32::from_rgb(0xff, 0xa5, 0x00),
            Body::Earth => Color32::from_rgb(0x41, 0x69, 0xe1),
            Body::Moon => Color32::from_rgb(0xd3, 0xd3, 0xd3),
            Body::Mars => Color32::from_rgb(0xff, 0x45, 0x00),
            Body::Jupiter => Color32::from_rgb(0xff, 0xd7, 0x00),
            Body::Saturn => Color32::from_rgb(0xf0, 0xe6, 0x8c),
            Body::Uranus => Color32::from_rgb(0x00, 0xff, 0xff),
            Body::Neptune => Color32::from_rgb(0x41, 0x41, 0xff),
            Body::Pluto => Color32::from_rgb(0xa9, 0xa9, 0xa9),
        }
    }

    /// Relative visual size. Not to scale; matches the ratios the data
    /// generator ships with.
    pub fn display_size(&self) -> f32 {
        match self {
            Body::Sun => 20.0,
            Body::Mercury => 5.0,
            Body::Venus => 8.0,
            Body::Earth => 9.0,
            Body::Moon => 2.0,
            Body::Mars => 7.0,
            Body::Jupiter => 15.0,
            Body::Saturn => 13.0,
            Body::Uranus => 11.0,
            Body::Neptune => 10.0,
            Body::Pluto => 3.0,
        }
    }

    /// Mean heliocentric distance, used only for the orbit guide rings.
    pub fn orbit_radius_au(&self) -> Option<f64> {
        match self {
            Body::Sun | Body::Moon => None,
            Body::Mercury => Some(0.387),
            Body::Venus => Some(0.723),
            Body::Earth => Some(1.0),
            Body::Mars => Some(1.524),
            Body::Jupiter => Some(5.203),
            Body::Saturn => Some(9.537),
            Body::Uranus => Some(19.191),
            Body::Neptune => Some(30.07),
            Body::Pluto => Some(39.48),
        }
    }

    /// The primary this body orbits, when its position should be rendered
    /// as a geocentric offset rather than in the absolute frame.
    pub fn parent(&self) -> Option<Body> {
        match self {
            Body::Moon => Some(Body::Earth),
            _ => None,
        }
    }

    /// Per-body image asset, by naming convention.
    pub fn texture_filename(&self) -> String {
        format!("textures/{}_2k.jpg", self.data_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_key_round_trips() {
        for body in Body::ALL {
            assert_eq!(Body::from_key(body.data_key()), Some(body));
        }
        assert_eq!(Body::from_key("vulcan"), None);
    }

    #[test]
    fn only_the_moon_has_a_parent() {
        for body in Body::ALL {
            match body {
                Body::Moon => assert_eq!(body.parent(), Some(Body::Earth)),
                _ => assert_eq!(body.parent(), None),
            }
        }
    }

    #[test]
    fn orbit_radii_increase_outward() {
        let order = [
            Body::Mercury,
            Body::Venus,
            Body::Earth,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
            Body::Uranus,
            Body::Neptune,
            Body::Pluto,
        ];
        let mut prev = 0.0;
        for body in order {
            let r = body.orbit_radius_au().unwrap();
            assert!(r > prev, "{:?} orbit radius out of order", body);
            prev = r;
        }
        assert_eq!(Body::Sun.orbit_radius_au(), None);
        assert_eq!(Body::Moon.orbit_radius_au(), None);
    }

    #[test]
    fn texture_names_follow_convention() {
        assert_eq!(Body::Earth.texture_filename(), "textures/earth_2k.jpg");
        assert_eq!(Body::Moon.texture_filename(), "textures/moon_2k.jpg");
    }
}
