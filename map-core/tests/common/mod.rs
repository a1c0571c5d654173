#![allow(dead_code)]

use std::collections::HashMap;

use map_core::render::MarkerSpec;
use map_core::{EntityKind, IngestError, MapBackend, MapConfig, MapError, SourceFetcher};

pub const ENTERPRISES: &str = "\
SIRET,SIREN,Enseigne de l'établissement 1,Adresse de l'établissement,Etat administratif de l'établissement,Géolocalisation de l'établissement,lat,lon
123,123000000,Boulangerie X,1 Rue Victor Hugo,A,,16.2,-61.48
124,124000000,Garage fermé,2 Rue Victor Hugo,F,\"16.21,-61.49\",,
999,999000000,Premier,3 Rue Victor Hugo,A,\"(16.22, -61.47)\",,
999,999000000,Second,4 Rue Victor Hugo,A,\"(16.23, -61.46)\",,
125,125000000,Sans position,5 Rue Victor Hugo,A,,,
";

pub const PUBLICS: &str = "\
SIRET,Dénomination de l'unité légale,Etat administratif de l'établissement,latitude,longitude
200,Mairie du Gosier,A,\"16,2061\",\"-61,4930\"
201,École Mixte,A,16.21,-61.49
";

/// Semicolon-separated, Windows-1252 encoded, like the older RNA exports.
pub fn associations_latin1() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"id_association;titre_court;num_voie;type_voie;libelle_voie;objet;date_creation;date_dissolution;latlong\r\n");
    bytes.extend_from_slice(b"W9G1;Club de voile;12;RUE;des Palmiers;Promotion de la voile;2001-03-04;;\"16,2;-61,48\"\r\n");
    bytes.extend_from_slice(b"W9G2;Amicale dissoute;;;;Loisirs;1999-01-01;2010-06-30;\"16,2;-61,48\"\r\n");
    bytes.extend_from_slice(b"W9G3;Comit\xe9 des f\xeates;;;;F\xeates locales;2005-07-14;;\"16,3;-61,5\"\r\n");
    bytes
}

#[derive(Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn with_defaults() -> Self {
        let cfg = MapConfig::default();
        MemoryFetcher::default()
            .with(&cfg.sources.enterprise, ENTERPRISES.as_bytes().to_vec())
            .with(&cfg.sources.public_establishment, PUBLICS.as_bytes().to_vec())
            .with(&cfg.sources.association, associations_latin1())
    }

    pub fn with(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn without(mut self, path: &str) -> Self {
        self.files.remove(path);
        self
    }
}

impl SourceFetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, IngestError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| IngestError::Fetch {
                path: path.to_string(),
                reason: "HTTP 404".to_string(),
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    CreateMap(u32),
    CreateGroup(u32, EntityKind),
    AddMarkers(u32, usize),
    Attach(u32),
    Detach(u32),
    Release(u32, usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: u32,
    pub kind: EntityKind,
}

/// Records every backend call instead of drawing.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub live_maps: Vec<u32>,
    next_id: u32,
    pub fail_group: Option<EntityKind>,
    pub fail_markers: bool,
}

impl Recorder {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn attach_calls(&self, group: u32) -> usize {
        self.count(|e| *e == Event::Attach(group))
    }

    pub fn detach_calls(&self, group: u32) -> usize {
        self.count(|e| *e == Event::Detach(group))
    }
}

impl MapBackend for Recorder {
    type Surface = str;
    type Map = u32;
    type Group = Group;

    fn create_map(&mut self, _surface: &str, _config: &MapConfig) -> Result<u32, MapError> {
        let id = self.next();
        self.live_maps.push(id);
        self.events.push(Event::CreateMap(id));
        Ok(id)
    }

    fn create_group(
        &mut self,
        _map: &u32,
        kind: EntityKind,
        _config: &MapConfig,
    ) -> Result<Group, MapError> {
        if self.fail_group == Some(kind) {
            return Err(MapError::Backend(format!("markercluster missing for {kind}")));
        }
        let id = self.next();
        self.events.push(Event::CreateGroup(id, kind));
        Ok(Group { id, kind })
    }

    fn add_markers(&mut self, group: &Group, markers: Vec<MarkerSpec>) -> Result<(), MapError> {
        if self.fail_markers {
            return Err(MapError::Backend("marker rejected".into()));
        }
        self.events.push(Event::AddMarkers(group.id, markers.len()));
        Ok(())
    }

    fn attach(&mut self, _map: &u32, group: &Group) {
        self.events.push(Event::Attach(group.id));
    }

    fn detach(&mut self, _map: &u32, group: &Group) {
        self.events.push(Event::Detach(group.id));
    }

    fn release(&mut self, map: u32, groups: Vec<Group>) {
        self.live_maps.retain(|m| *m != map);
        self.events.push(Event::Release(map, groups.len()));
    }
}
