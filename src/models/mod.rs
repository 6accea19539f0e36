use serde::{Deserialize, Serialize};

/// One harvested vehicle listing.
///
/// Every field holds the raw marketplace text, units and currency
/// formatting included. Numeric cleaning belongs to the price model
/// pipeline that reads the exported CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub engine_size: String,
    pub horsepower: String,
    pub mileage: String,
    pub gearbox: String,
    pub production_year: String,
    pub fuel_type: String,
    pub price: String,
}

impl ListingRecord {
    /// Column names of the exported table, in row order.
    pub const COLUMNS: [&'static str; 7] = [
        "engine_size",
        "horsepower",
        "mileage",
        "gearbox",
        "production_year",
        "fuel_type",
        "price",
    ];

    /// Field values in [`ListingRecord::COLUMNS`] order.
    pub fn as_row(&self) -> [&str; 7] {
        [
            &self.engine_size,
            &self.horsepower,
            &self.mileage,
            &self.gearbox,
            &self.production_year,
            &self.fuel_type,
            &self.price,
        ]
    }
}

/// Make display names offered to users, in presentation order.
///
/// The scraper never derives this list from the site; it only normalizes
/// whichever name it is handed.
pub const MAKES: &[&str] = &[
    "BMW", "Volkswagen", "Audi", "Ford", "Mercedes-Benz", "Opel", "Toyota",
    "Skoda", "Renault", "Peugeot", "Abarth", "Acura", "Aiways", "Aixam",
    "Alfa Romeo", "Alpine", "Asia", "Aston Martin", "Austin", "Autobianchi",
    "Baic", "Bentley", "BMW-ALPINA", "Brilliance", "Bugatti", "Buick", "BYD",
    "Cadillac", "Casalini", "Caterham", "Cenntro", "Changan", "Chatenet",
    "Chevrolet", "Chrysler", "Citroën", "Cupra", "Dacia", "Daewoo", "Daihatsu",
    "DeLorean", "DFM", "DFSK", "DKW", "Dodge", "Doosan", "DR MOTOR",
    "DS Automobiles", "e.GO", "Elaris", "FAW", "Ferrari", "Fiat", "Fisker",
    "Gaz", "Geely", "Genesis", "GMC", "GWM", "HiPhi", "Honda", "Hongqi",
    "Hummer", "Hyundai", "Ineos", "Infiniti", "Inny", "Isuzu", "Iveco", "JAC",
    "Jaguar", "Jeep", "Jetour", "Jinpeng", "Kia", "KTM", "Lada", "Lamborghini",
    "Lancia", "Land Rover", "Leapmotor", "LEVC", "Lexus", "Ligier", "Lincoln",
    "Lixiang", "Lotus", "LTI", "Lucid", "Lynk & Co", "MAN", "Maserati",
    "MAXIMUS", "Maxus", "Maybach", "Mazda", "McLaren", "Mercury", "MG",
    "Microcar", "MINI", "Mitsubishi", "Morgan", "NIO", "Nissan", "Nysa",
    "Oldsmobile", "Omoda", "Piaggio", "Plymouth", "Polestar", "Polonez",
    "Pontiac", "Porsche", "RAM", "Rolls-Royce", "Rover", "Saab",
    "Saturn", "Seat", "Seres", "Shuanghuan", "Skywell", "Smart", "SsangYong",
    "Subaru", "Suzuki", "Syrena", "Tarpan", "Tata", "Tesla", "Trabant", "Triumph",
    "Uaz", "Vauxhall", "VELEX", "Volvo", "Voyah", "Warszawa",
    "Wartburg", "Wołga", "XPeng", "Zaporożec", "Zastava", "ZEEKR", "Żuk",
];
