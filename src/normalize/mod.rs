//! Record normalization
//!
//! Flattens nested crash cards into three flat record sets linked by
//! generated ids: crashes, vehicles and participants. Drivers listed under a
//! vehicle keep a link to that vehicle; crash-level participants do not.

use crate::crashes::{CrashCard, CrashPage, ParticipantInfo, VehicleInfo};
use serde::Serialize;

/// Separator used when a list-valued field is flattened into one column
pub const LIST_SEPARATOR: &str = "; ";

fn join(values: &[String]) -> String {
    values.join(LIST_SEPARATOR)
}

/// One crash row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrashRecord {
    pub id: u64,
    pub card_id: u64,
    pub region_name: String,
    pub crash_type: String,
    pub district: String,
    pub date: String,
    pub time: String,
    pub vehicles_amount: u32,
    pub participants_amount: u32,
    pub deceased: u32,
    pub wounded: u32,
    pub row: u32,
    pub longitude: f64,
    pub latitude: f64,
    pub objects_near_crash: String,
    pub motion_changes: String,
    pub main_road: String,
    pub road_category: String,
    pub road_significance: String,
    pub motion_affecting_factors: String,
    pub house: String,
    pub street_category: String,
    pub km: String,
    pub m: String,
    pub settlement: String,
    pub road_deficiencies: String,
    pub light_conditions: String,
    pub s_dtp: String,
    pub road_conditions: String,
    pub weather: String,
    pub road_objects: String,
    pub street: String,
}

impl CrashRecord {
    /// Column names, in field order
    pub const HEADERS: &'static [&'static str] = &[
        "id",
        "card_id",
        "region_name",
        "crash_type",
        "district",
        "date",
        "time",
        "vehicles_amount",
        "participants_amount",
        "deceased",
        "wounded",
        "row",
        "longitude",
        "latitude",
        "objects_near_crash",
        "motion_changes",
        "main_road",
        "road_category",
        "road_significance",
        "motion_affecting_factors",
        "house",
        "street_category",
        "km",
        "m",
        "settlement",
        "road_deficiencies",
        "light_conditions",
        "s_dtp",
        "road_conditions",
        "weather",
        "road_objects",
        "street",
    ];
}

/// One vehicle row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub id: u64,
    pub crash_id: u64,
    pub color: String,
    pub property_form: String,
    pub issued_year: String,
    pub damage_points: String,
    pub model: String,
    pub brand: String,
    pub number: String,
    pub o_pf: String,
    pub steering: String,
    pub technical_defects: String,
    pub vehicle_type: String,
    pub left_crash_site: String,
}

impl VehicleRecord {
    pub const HEADERS: &'static [&'static str] = &[
        "id",
        "crash_id",
        "color",
        "property_form",
        "issued_year",
        "damage_points",
        "model",
        "brand",
        "number",
        "o_pf",
        "steering",
        "technical_defects",
        "vehicle_type",
        "left_crash_site",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Driver,
    Passenger,
}

/// One participant row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRecord {
    pub id: u64,
    pub crash_id: u64,
    pub vehicle_id: Option<u64>,
    pub role: ParticipantRole,
    pub alcohol_level: String,
    pub category: String,
    pub gender: String,
    pub direct_violations: String,
    pub number: String,
    pub supplemental_violations: String,
    pub left_crash_site: String,
    pub injury_severity: String,
    pub driving_experience: String,
    pub injured_card_id: String,
    pub safety_belt: String,
    pub seat_group: String,
}

impl ParticipantRecord {
    pub const HEADERS: &'static [&'static str] = &[
        "id",
        "crash_id",
        "vehicle_id",
        "role",
        "alcohol_level",
        "category",
        "gender",
        "direct_violations",
        "number",
        "supplemental_violations",
        "left_crash_site",
        "injury_severity",
        "driving_experience",
        "injured_card_id",
        "safety_belt",
        "seat_group",
    ];
}

/// The three record sets produced from a sequence of pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecords {
    pub crashes: Vec<CrashRecord>,
    pub vehicles: Vec<VehicleRecord>,
    pub participants: Vec<ParticipantRecord>,
}

impl NormalizedRecords {
    pub fn is_empty(&self) -> bool {
        self.crashes.is_empty()
    }
}

/// Incremental normalizer; ids keep increasing across pushed pages
#[derive(Debug, Default)]
pub struct Normalizer {
    records: NormalizedRecords,
    next_crash: u64,
    next_vehicle: u64,
    next_participant: u64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens every card of a page
    pub fn push_page(&mut self, page: &CrashPage) {
        for card in &page.cards {
            self.push_card(&page.region_name, card);
        }
    }

    fn push_card(&mut self, region_name: &str, card: &CrashCard) {
        self.next_crash += 1;
        let crash_id = self.next_crash;
        let info = &card.info;

        self.records.crashes.push(CrashRecord {
            id: crash_id,
            card_id: card.id,
            region_name: region_name.to_string(),
            crash_type: card.crash_type.clone(),
            district: card.district.clone(),
            date: card.date.clone(),
            time: card.time.clone(),
            vehicles_amount: card.vehicles_amount,
            participants_amount: card.participants_amount,
            deceased: card.deceased,
            wounded: card.wounded,
            row: card.row,
            longitude: info.longitude,
            latitude: info.latitude,
            objects_near_crash: join(&info.objects_near_crash),
            motion_changes: info.motion_changes.clone(),
            main_road: info.main_road.clone(),
            road_category: info.road_category.clone(),
            road_significance: info.road_significance.clone(),
            motion_affecting_factors: join(&info.motion_affecting_factors),
            house: info.house.clone(),
            street_category: info.street_category.clone(),
            km: info.km.clone(),
            m: info.m.clone(),
            settlement: info.settlement.clone(),
            road_deficiencies: join(&info.road_deficiencies),
            light_conditions: info.light_conditions.clone(),
            s_dtp: info.s_dtp.clone(),
            road_conditions: info.road_conditions.clone(),
            weather: join(&info.weather),
            road_objects: join(&info.road_objects),
            street: info.street.clone(),
        });

        for vehicle in &info.vehicles {
            self.push_vehicle(crash_id, vehicle);
        }

        for participant in &info.participants {
            self.push_participant(crash_id, None, ParticipantRole::Passenger, participant);
        }
    }

    fn push_vehicle(&mut self, crash_id: u64, vehicle: &VehicleInfo) {
        self.next_vehicle += 1;
        let vehicle_id = self.next_vehicle;

        self.records.vehicles.push(VehicleRecord {
            id: vehicle_id,
            crash_id,
            color: vehicle.color.clone(),
            property_form: vehicle.property_form.clone(),
            issued_year: vehicle.issued_year.clone(),
            damage_points: vehicle.damage_points.clone(),
            model: vehicle.model.clone(),
            brand: vehicle.brand.clone(),
            number: vehicle.number.clone(),
            o_pf: vehicle.o_pf.clone(),
            steering: vehicle.steering.clone(),
            technical_defects: vehicle.technical_defects.clone(),
            vehicle_type: vehicle.vehicle_type.clone(),
            left_crash_site: vehicle.left_crash_site.clone(),
        });

        for occupant in &vehicle.occupants {
            self.push_participant(crash_id, Some(vehicle_id), ParticipantRole::Driver, occupant);
        }
    }

    fn push_participant(
        &mut self,
        crash_id: u64,
        vehicle_id: Option<u64>,
        role: ParticipantRole,
        person: &ParticipantInfo,
    ) {
        self.next_participant += 1;

        self.records.participants.push(ParticipantRecord {
            id: self.next_participant,
            crash_id,
            vehicle_id,
            role,
            alcohol_level: person.alcohol_level.clone(),
            category: person.category.clone(),
            gender: person.gender.clone(),
            direct_violations: join(&person.direct_violations),
            number: person.number.clone(),
            supplemental_violations: join(&person.supplemental_violations),
            left_crash_site: person.left_crash_site.clone(),
            injury_severity: person.injury_severity.clone(),
            driving_experience: person.driving_experience.clone(),
            injured_card_id: person.injured_card_id.clone(),
            safety_belt: person.safety_belt.clone(),
            seat_group: person.seat_group.clone(),
        });
    }

    pub fn finish(self) -> NormalizedRecords {
        self.records
    }
}

/// Flattens a sequence of pages into record sets
pub fn normalize(pages: &[CrashPage]) -> NormalizedRecords {
    let mut normalizer = Normalizer::new();
    for page in pages {
        normalizer.push_page(page);
    }
    let records = normalizer.finish();

    tracing::debug!(
        "Normalized {} crashes, {} vehicles, {} participants",
        records.crashes.len(),
        records.vehicles.len(),
        records.participants.len()
    );
    records
}
