//! Expand/flatten helpers shared by managed database resources.
//!
//! The capacity, maintenance window and backup window blocks have the
//! same shape across database engines, so their mappings live here and
//! stay out of the per-engine resource modules.

use cirrus_common::api::mdb::{
    maintenance_window, Anytime, MaintenanceWindow, Resources, TimeOfDay, WeeklyMaintenanceWindow,
    ENVIRONMENT_NAMES, WEEK_DAY_NAMES,
};
use cirrus_common::datasize;

use crate::diag::Diagnostics;
use crate::state::{
    block_value, get_int_attr, get_optional_string_attr, get_string_attr, int_value, string_value,
    DynamicValue,
};

use super::{expand_enum, flatten_enum};

const MAINTENANCE_TYPE_ANYTIME: &str = "ANYTIME";
const MAINTENANCE_TYPE_WEEKLY: &str = "WEEKLY";

/// Engine-independent view of a cluster capacity message.
pub trait ClusterResources: Default {
    fn set_resource_preset_id(&mut self, id: String);
    fn set_disk_size(&mut self, bytes: i64);
    fn set_disk_type_id(&mut self, id: String);
}

impl ClusterResources for Resources {
    fn set_resource_preset_id(&mut self, id: String) {
        self.resource_preset_id = id;
    }

    fn set_disk_size(&mut self, bytes: i64) {
        self.disk_size = bytes;
    }

    fn set_disk_type_id(&mut self, id: String) {
        self.disk_type_id = id;
    }
}

/// Expand a `resources` block. Disk size is declared in gigabytes and
/// travels in bytes.
pub fn expand_resources<T: ClusterResources>(
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> T {
    let mut resources = T::default();
    match get_optional_string_attr(block, "resource_preset_id") {
        Some(preset) => resources.set_resource_preset_id(preset),
        None => diags.add_attribute_error("resources.0.resource_preset_id", "must be set"),
    }
    let disk_gb = get_int_attr(block, "disk_size", 0);
    if disk_gb <= 0 {
        diags.add_attribute_error("resources.0.disk_size", "must be a positive number of gigabytes");
    }
    resources.set_disk_size(datasize::to_bytes(disk_gb));
    if let Some(disk_type) = get_optional_string_attr(block, "disk_type_id") {
        resources.set_disk_type_id(disk_type);
    }
    resources
}

pub fn flatten_resources(resources: &Resources) -> DynamicValue {
    block_value(vec![
        (
            "resource_preset_id",
            string_value(&resources.resource_preset_id),
        ),
        (
            "disk_size",
            int_value(datasize::to_gigabytes(resources.disk_size)),
        ),
        ("disk_type_id", string_value(&resources.disk_type_id)),
    ])
}

pub fn expand_environment(value: &str, diags: &mut Diagnostics) -> i32 {
    expand_enum("environment", value, ENVIRONMENT_NAMES, diags)
}

/// Expand a `maintenance_window` block with a `type` of `ANYTIME` or
/// `WEEKLY`; weekly windows carry a day of week and an hour (1..=24).
pub fn expand_maintenance_window(
    block: &DynamicValue,
    diags: &mut Diagnostics,
) -> Option<MaintenanceWindow> {
    let day = get_optional_string_attr(block, "day");
    let hour = get_int_attr(block, "hour", 0);
    match get_string_attr(block, "type").as_str() {
        MAINTENANCE_TYPE_ANYTIME => {
            if day.is_some() || hour != 0 {
                diags.add_attribute_error(
                    "maintenance_window",
                    "day and hour must not be set when type is ANYTIME",
                );
                return None;
            }
            Some(MaintenanceWindow {
                policy: Some(maintenance_window::Policy::Anytime(Anytime {})),
            })
        }
        MAINTENANCE_TYPE_WEEKLY => {
            let day = match day {
                Some(d) => expand_enum("maintenance_window.0.day", &d, WEEK_DAY_NAMES, diags),
                None => {
                    diags.add_attribute_error(
                        "maintenance_window.0.day",
                        "must be set when type is WEEKLY",
                    );
                    0
                }
            };
            if !(1..=24).contains(&hour) {
                diags.add_attribute_error(
                    "maintenance_window.0.hour",
                    "must be between 1 and 24",
                );
            }
            Some(MaintenanceWindow {
                policy: Some(maintenance_window::Policy::WeeklyMaintenanceWindow(
                    WeeklyMaintenanceWindow { day, hour },
                )),
            })
        }
        other => {
            diags.add_attribute_error(
                "maintenance_window.0.type",
                format!("must be ANYTIME or WEEKLY, not {other:?}"),
            );
            None
        }
    }
}

pub fn flatten_maintenance_window(window: &MaintenanceWindow) -> DynamicValue {
    match &window.policy {
        Some(maintenance_window::Policy::Anytime(_)) => {
            block_value(vec![("type", string_value(MAINTENANCE_TYPE_ANYTIME))])
        }
        Some(maintenance_window::Policy::WeeklyMaintenanceWindow(weekly)) => block_value(vec![
            ("type", string_value(MAINTENANCE_TYPE_WEEKLY)),
            ("day", string_value(flatten_enum(weekly.day, WEEK_DAY_NAMES))),
            ("hour", int_value(weekly.hour)),
        ]),
        None => DynamicValue::Null,
    }
}

pub fn expand_backup_window(block: &DynamicValue, diags: &mut Diagnostics) -> TimeOfDay {
    let hours = get_int_attr(block, "hours", 0);
    let minutes = get_int_attr(block, "minutes", 0);
    if !(0..24).contains(&hours) {
        diags.add_attribute_error("backup_window_start.0.hours", "must be between 0 and 23");
    }
    if !(0..60).contains(&minutes) {
        diags.add_attribute_error("backup_window_start.0.minutes", "must be between 0 and 59");
    }
    TimeOfDay {
        hours: hours as i32,
        minutes: minutes as i32,
    }
}

pub fn flatten_backup_window(window: &TimeOfDay) -> DynamicValue {
    block_value(vec![
        ("hours", int_value(window.hours as i64)),
        ("minutes", int_value(window.minutes as i64)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::make_state;

    #[test]
    fn resources_convert_gigabytes_to_bytes() {
        let block = make_state(vec![
            ("resource_preset_id", string_value("s2.micro")),
            ("disk_size", int_value(20)),
            ("disk_type_id", string_value("network-ssd")),
        ]);
        let mut diags = Diagnostics::new();
        let resources: Resources = expand_resources(&block, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(resources.disk_size, 20 * (1 << 30));
        assert_eq!(resources.resource_preset_id, "s2.micro");

        let state = flatten_resources(&resources);
        let flat = state.as_list().unwrap().first().unwrap();
        assert_eq!(get_int_attr(flat, "disk_size", 0), 20);
    }

    #[test]
    fn resources_require_preset_and_size() {
        let block = make_state(vec![]);
        let mut diags = Diagnostics::new();
        let _: Resources = expand_resources(&block, &mut diags);
        let err = diags.into_result().unwrap_err().to_string();
        assert!(err.contains("resource_preset_id"), "{err}");
        assert!(err.contains("disk_size"), "{err}");
    }

    #[test]
    fn weekly_maintenance_window_round_trip() {
        let block = make_state(vec![
            ("type", string_value("WEEKLY")),
            ("day", string_value("SAT")),
            ("hour", int_value(3)),
        ]);
        let mut diags = Diagnostics::new();
        let window = expand_maintenance_window(&block, &mut diags).unwrap();
        assert!(!diags.has_errors(), "{:?}", diags.entries());

        let state = flatten_maintenance_window(&window);
        let flat = state.as_list().unwrap().first().unwrap();
        assert_eq!(get_string_attr(flat, "type"), "WEEKLY");
        assert_eq!(get_string_attr(flat, "day"), "SAT");
        assert_eq!(get_int_attr(flat, "hour", 0), 3);
    }

    #[test]
    fn anytime_window_rejects_day_and_hour() {
        let block = make_state(vec![
            ("type", string_value("ANYTIME")),
            ("day", string_value("MON")),
        ]);
        let mut diags = Diagnostics::new();
        assert!(expand_maintenance_window(&block, &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn weekly_window_validates_hour_range() {
        let block = make_state(vec![
            ("type", string_value("WEEKLY")),
            ("day", string_value("MON")),
            ("hour", int_value(25)),
        ]);
        let mut diags = Diagnostics::new();
        expand_maintenance_window(&block, &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn backup_window_validates_ranges() {
        let block = make_state(vec![
            ("hours", int_value(23)),
            ("minutes", int_value(59)),
        ]);
        let mut diags = Diagnostics::new();
        let window = expand_backup_window(&block, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(window.hours, 23);
        assert_eq!(window.minutes, 59);

        let bad = make_state(vec![("hours", int_value(24))]);
        let mut diags = Diagnostics::new();
        expand_backup_window(&bad, &mut diags);
        assert!(diags.has_errors());
    }
}
