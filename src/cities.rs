/// 城市点（WGS84）
#[derive(Debug, Clone, Copy)]
pub struct City {
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
}

const fn city(name: &'static str, lon: f64, lat: f64) -> City {
    City { name, lon, lat }
}

/// 固定叠加在地图上的城市
pub const CITIES: &[City] = &[
    city("Berlin", 13.404954, 52.520008),
    city("Hamburg", 9.993682, 53.551086),
    city("München", 11.581981, 48.135125),
    city("Köln", 6.960279, 50.937531),
    city("Frankfurt", 8.682127, 50.110922),
    city("Dresden", 13.737262, 51.050409),
    city("Wien", 16.373819, 48.208174),
    city("Bern", 7.447447, 46.947974),
    city("Paris", 2.352222, 48.856614),
    city("Amsterdam", 4.904139, 52.367573),
    city("Brüssel", 4.351710, 50.850340),
    city("Kopenhagen", 12.568337, 55.676098),
    city("Warschau", 21.012229, 52.229676),
    city("Prag", 14.437800, 50.075538),
    city("Rom", 12.496366, 41.902782),
    city("Madrid", -3.703790, 40.416775),
    city("Lissabon", -9.139337, 38.722252),
    city("London", -0.127758, 51.507351),
    city("Dublin", -6.260310, 53.349805),
];
