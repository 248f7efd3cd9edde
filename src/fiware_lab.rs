/*
 fiware-stack
 Copyright 2025 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

// Base images and regions offered by FIWARE Lab.

#[derive(Clone, Debug, PartialEq)]
pub struct LabImage {
    pub slug:       &'static str,
    pub name:       &'static str,
    pub ssh_user:   &'static str,
}

pub const IMAGES: &[LabImage] = &[
    LabImage { slug: "base_ubuntu_14.04", name: "Ubuntu 14.04 LTS",       ssh_user: "ubuntu" },
    LabImage { slug: "base_ubuntu_12.04", name: "Ubuntu 12.04 LTS",       ssh_user: "ubuntu" },
    LabImage { slug: "base_centos_7",     name: "CentOS 7 Generic Cloud", ssh_user: "centos" },
    LabImage { slug: "base_centos_6",     name: "CentOS 6 Generic Cloud", ssh_user: "centos" },
];

pub const REGIONS: &[&str] = &[
    "Britanny",
    "Budapest2",
    "Budapest3",
    "Crete",
    "Genoa",
    "Lannion3",
    "Lannion4",
    "Mexico",
    "Poznan",
    "SaoPaulo",
    "SophiaAntipolis2",
    "Spain2",
    "SpainTenerife",
    "Trento2",
    "Vicenza",
    "Volos",
    "Wroclaw",
    "Zurich2",
    "ZurichS",
];

pub fn find_image(slug: &str) -> Option<&'static LabImage> {
    IMAGES.iter().find(|image| image.slug == slug)
}

pub fn is_known_region(region: &str) -> bool {
    REGIONS.contains(&region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_image() {
        assert_eq!(find_image("base_centos_7").map(|i| i.ssh_user), Some("centos"));
        assert!(find_image("windows").is_none());
    }

    #[test]
    fn test_regions() {
        assert!(is_known_region("Spain2"));
        assert!(!is_known_region("spain2"));
        assert_eq!(REGIONS.len(), 19);
    }
}
