use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleClass {
    pub key: &'static str,
    pub label: &'static str,
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub per_minute_rate: f64,
    pub max_passengers: u8,
    pub icon: &'static str,
}

pub const VEHICLES: &[VehicleClass] = &[
    VehicleClass {
        key: "bike",
        label: "Bike",
        base_fare: 20.0,
        per_km_rate: 18.0,
        per_minute_rate: 0.8,
        max_passengers: 1,
        icon: "🚲",
    },
    VehicleClass {
        key: "car",
        label: "Car",
        base_fare: 40.0,
        per_km_rate: 25.0,
        per_minute_rate: 1.2,
        max_passengers: 4,
        icon: "🚗",
    },
    VehicleClass {
        key: "xl",
        label: "XL",
        base_fare: 70.0,
        per_km_rate: 32.0,
        per_minute_rate: 1.5,
        max_passengers: 6,
        icon: "🚙",
    },
    VehicleClass {
        key: "premium",
        label: "Premium",
        base_fare: 120.0,
        per_km_rate: 45.0,
        per_minute_rate: 2.0,
        max_passengers: 4,
        icon: "⭐",
    },
];

/// Car is preselected for new ride requests.
pub fn default_vehicle() -> &'static VehicleClass {
    &VEHICLES[1]
}

pub fn find_vehicle(key: &str) -> Option<&'static VehicleClass> {
    VEHICLES.iter().find(|vehicle| vehicle.key == key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub const PAYMENTS: &[PaymentMethod] = &[
    PaymentMethod {
        key: "cash",
        label: "Cash",
        icon: "💵",
    },
    PaymentMethod {
        key: "card",
        label: "Card",
        icon: "💳",
    },
    PaymentMethod {
        key: "bkash",
        label: "bKash",
        icon: "📱",
    },
    PaymentMethod {
        key: "nagad",
        label: "Nagad",
        icon: "📱",
    },
];

pub fn default_payment() -> &'static PaymentMethod {
    &PAYMENTS[0]
}

pub fn find_payment(key: &str) -> Option<&'static PaymentMethod> {
    PAYMENTS.iter().find(|payment| payment.key == key)
}
