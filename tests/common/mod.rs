//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use route_narrator::{
    AudioClip, Coordinate, DEFAULT_TRIGGER_THRESHOLD, Error, Geocoder, NarrativeGenerator, Place,
    Planner, PlannerOptions, Result, Route, Router, SpeechSynthesizer,
};

/// Narrator answer for a drive through Seattle
pub const SEATTLE_NARRATIVE: &str = "\
Here are some stops along your drive:

1. [47.6097, -122.3422] **Pike Place Market** - One of the oldest continuously operated public farmers' markets in the United States.
2. [47.6205, -122.3493] The Space Needle offers panoramic views of the city.
3. [north, west] A stop with unusable coordinates.
4. [47.6513, -122.3470] The Fremont Troll lurks under the Aurora Bridge.
";

/// Geocoder backed by a fixed name table
pub struct FakeGeocoder {
    places: HashMap<String, Coordinate>,
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new(places: &[(&str, Coordinate)]) -> Self {
        Self {
            places: places
                .iter()
                .map(|(name, c)| ((*name).to_string(), *c))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, name: &str) -> Result<Coordinate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.places
            .get(name)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("no match for \"{name}\"")))
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let query = query.to_lowercase();
        let mut places: Vec<Place> = self
            .places
            .iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(&query))
            .map(|(name, c)| Place {
                name: name.clone(),
                coordinate: *c,
            })
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places.truncate(limit);
        Ok(places)
    }
}

/// Router returning a fixed path, or failing
pub struct FakeRouter {
    pub points: Option<Vec<Coordinate>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Router for FakeRouter {
    async fn route(&self, _start: Coordinate, _end: Coordinate) -> Result<Route> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.points {
            Some(points) => Route::new(points.clone()),
            None => Err(Error::Routing("no route between these points".to_string())),
        }
    }
}

/// Narrator returning fixed text, or failing
pub struct FakeNarrator {
    pub answer: Option<String>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl FakeNarrator {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NarrativeGenerator for FakeNarrator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
            .clone()
            .ok_or_else(|| Error::Narrative("model unavailable".to_string()))
    }
}

/// Speech that echoes the text as bytes and counts calls
#[derive(Default)]
pub struct FakeSpeech {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<AudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Tts("voice service down".to_string()));
        }
        Ok(AudioClip::mp3(text.as_bytes().to_vec()))
    }
}

/// Route from Pioneer Square to Fremont passing the narrative's stops
pub fn seattle_route() -> Vec<Coordinate> {
    vec![
        Coordinate::new(47.6015, -122.3343),
        Coordinate::new(47.6097, -122.3420),
        Coordinate::new(47.6150, -122.3300),
        Coordinate::new(47.6204, -122.3490),
        Coordinate::new(47.6350, -122.3480),
        Coordinate::new(47.6510, -122.3472),
    ]
}

pub fn seattle_geocoder() -> FakeGeocoder {
    FakeGeocoder::new(&[
        ("Pioneer Square", Coordinate::new(47.6015, -122.3343)),
        ("Fremont", Coordinate::new(47.6510, -122.3472)),
        ("Fremont Bridge", Coordinate::new(47.6475, -122.3497)),
    ])
}

pub fn options() -> PlannerOptions {
    PlannerOptions {
        poi_count: 3,
        max_prompt_points: 50,
        threshold: DEFAULT_TRIGGER_THRESHOLD,
    }
}

/// Planner over fakes, returning the narrator so prompts can be inspected
pub fn planner_with(narrator: FakeNarrator) -> (Planner, Arc<FakeNarrator>) {
    let narrator = Arc::new(narrator);
    let planner = Planner::new(
        Arc::new(seattle_geocoder()),
        Arc::new(FakeRouter {
            points: Some(seattle_route()),
            calls: AtomicUsize::new(0),
        }),
        narrator.clone(),
        options(),
    );
    (planner, narrator)
}

/// What the stub HTTP server does with one connection
pub enum Reply {
    /// Accept and never answer
    Hang,
    /// Write this raw HTTP response and close
    Raw(String),
}

/// HTTP response text with a body and extra headers
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let extra: String = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect();
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{extra}\r\n{body}",
        body.len()
    )
}

/// Local HTTP server answering one scripted reply per connection
pub struct StubServer {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a stub server; connections past the script are refused
pub async fn stub_server(replies: Vec<Reply>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        for reply in replies {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            match reply {
                Reply::Hang => {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        drop(stream);
                    });
                }
                Reply::Raw(response) => {
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            }
        }
    });

    StubServer { url, hits }
}
