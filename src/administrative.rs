use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawWard {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDistrict {
    id: String,
    name: String,
    #[serde(default)]
    wards: Vec<RawWard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProvince {
    id: String,
    name: String,
    #[serde(default)]
    districts: Vec<RawDistrict>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct AdministrativeUnit {
    pub code: String,
    pub name: String,
}

#[derive(Debug)]
struct District {
    unit: AdministrativeUnit,
    wards: Vec<AdministrativeUnit>,
}

#[derive(Debug)]
struct Province {
    unit: AdministrativeUnit,
    districts: Vec<District>,
}

/// Province / district / ward table. Built once at startup and shared
/// read-only between workers.
#[derive(Debug, Default)]
pub struct AdministrativeDirectory {
    provinces: Vec<Province>,
}

fn same_name(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

impl AdministrativeDirectory {
    #[tracing::instrument(name = "Load administrative directory")]
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        let data: Vec<RawProvince> =
            serde_json::from_str(raw).context("Invalid administrative dataset")?;
        let provinces = data
            .into_iter()
            .map(|province| Province {
                unit: AdministrativeUnit {
                    code: province.id,
                    name: province.name,
                },
                districts: province
                    .districts
                    .into_iter()
                    .map(|district| District {
                        unit: AdministrativeUnit {
                            code: district.id,
                            name: district.name,
                        },
                        wards: district
                            .wards
                            .into_iter()
                            .map(|ward| AdministrativeUnit {
                                code: ward.id,
                                name: ward.name,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Ok(Self { provinces })
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    pub fn provinces(&self) -> Vec<AdministrativeUnit> {
        self.provinces.iter().map(|p| p.unit.clone()).collect()
    }

    fn province(&self, province_code: &str) -> Option<&Province> {
        self.provinces.iter().find(|p| p.unit.code == province_code)
    }

    pub fn districts(&self, province_code: &str) -> Option<Vec<AdministrativeUnit>> {
        self.province(province_code)
            .map(|p| p.districts.iter().map(|d| d.unit.clone()).collect())
    }

    pub fn wards(&self, province_code: &str, district_code: &str) -> Option<Vec<AdministrativeUnit>> {
        self.province(province_code)?
            .districts
            .iter()
            .find(|d| d.unit.code == district_code)
            .map(|d| d.wards.clone())
    }

    /// Checks that the ward belongs to the district and the district to the
    /// province, matching by name. An empty directory accepts everything.
    pub fn validate_location(&self, province: &str, district: &str, ward: &str) -> Result<(), String> {
        if self.is_empty() {
            return Ok(());
        }
        let province_obj = self
            .provinces
            .iter()
            .find(|p| same_name(&p.unit.name, province))
            .ok_or_else(|| format!("Unknown province: {}", province))?;
        let district_obj = province_obj
            .districts
            .iter()
            .find(|d| same_name(&d.unit.name, district))
            .ok_or_else(|| format!("{} is not a district of {}", district, province))?;
        if district_obj.wards.iter().any(|w| same_name(&w.name, ward)) {
            Ok(())
        } else {
            Err(format!("{} is not a ward of {}", ward, district))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AdministrativeDirectory;

    const SAMPLE: &str = r#"[
        {"Id": "01", "Name": "Thành phố Hà Nội", "Districts": [
            {"Id": "001", "Name": "Quận Ba Đình", "Wards": [
                {"Id": "00001", "Name": "Phường Phúc Xá"}
            ]}
        ]},
        {"Id": "79", "Name": "Thành phố Hồ Chí Minh"}
    ]"#;

    #[test]
    fn test_lookup_by_code() {
        let directory = AdministrativeDirectory::from_json(SAMPLE).unwrap();
        assert_eq!(directory.provinces().len(), 2);
        assert_eq!(directory.districts("01").unwrap()[0].code, "001");
        assert!(directory.districts("79").unwrap().is_empty());
        assert!(directory.districts("99").is_none());
        assert_eq!(directory.wards("01", "001").unwrap()[0].name, "Phường Phúc Xá");
        assert!(directory.wards("01", "002").is_none());
    }

    #[test]
    fn test_validate_location_matches_hierarchy() {
        let directory = AdministrativeDirectory::from_json(SAMPLE).unwrap();
        assert!(directory
            .validate_location("thành phố hà nội", "Quận Ba Đình", "Phường Phúc Xá")
            .is_ok());
        assert!(directory
            .validate_location("Thành phố Hà Nội", "Quận Ba Đình", "Phường Bến Nghé")
            .is_err());
        assert!(directory
            .validate_location("Thành phố Hồ Chí Minh", "Quận Ba Đình", "Phường Phúc Xá")
            .is_err());
    }

    #[test]
    fn test_empty_directory_accepts_any_location() {
        let directory = AdministrativeDirectory::default();
        assert!(directory.validate_location("a", "b", "c").is_ok());
    }
}
