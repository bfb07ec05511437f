//! Query synthesis service

use std::collections::BTreeMap;

use chaff_domain::{ChaffError, QueryComplexity, Result, Session, Settings, TopicId};
use tracing::trace;

use super::topics::{self, TopicModel, START_PHRASES};
use crate::random::{self, RandomSource};

/// QWERTY adjacency for simulated fat-finger typos.
const KEY_NEIGHBORS: &[(char, &[char])] = &[
    ('a', &['q', 's', 'w', 'z']),
    ('b', &['v', 'g', 'h', 'n']),
    ('c', &['x', 'd', 'f', 'v']),
    ('d', &['s', 'e', 'r', 'f', 'c', 'x']),
    ('e', &['w', 'r', 'd', 's']),
    ('f', &['d', 'r', 't', 'g', 'v', 'c']),
    ('g', &['f', 't', 'y', 'h', 'b', 'v']),
    ('h', &['g', 'y', 'u', 'j', 'n', 'b']),
    ('i', &['u', 'o', 'k', 'j']),
    ('j', &['h', 'u', 'i', 'k', 'm', 'n']),
    ('k', &['j', 'i', 'o', 'l', 'm']),
    ('l', &['k', 'o', 'p']),
    ('m', &['n', 'j', 'k']),
    ('n', &['b', 'h', 'j', 'm']),
    ('o', &['i', 'p', 'l', 'k']),
    ('p', &['o', 'l']),
    ('q', &['w', 'a']),
    ('r', &['e', 't', 'f', 'd']),
    ('s', &['a', 'w', 'e', 'd', 'x', 'z']),
    ('t', &['r', 'y', 'g', 'f']),
    ('u', &['y', 'i', 'j', 'h']),
    ('v', &['c', 'f', 'g', 'b']),
    ('w', &['q', 'e', 's', 'a']),
    ('x', &['z', 's', 'd', 'c']),
    ('y', &['t', 'u', 'h', 'g']),
    ('z', &['a', 's', 'x']),
];

/// Follow-up transformations applied to a prior query.
const REFINEMENTS: &[fn(&str) -> String] = &[
    |q| format!("{q} reddit"),
    |q| format!("{q} 2024"),
    |q| format!("best {q}"),
    |q| format!("{q} near me"),
    |q| format!("{q} reviews"),
    |q| format!("how to {q}"),
    |q| format!("{q} guide"),
    |q| format!("{q} tutorial"),
    |q| format!("cheap {q}"),
    |q| format!("{q} alternatives"),
];

/// Topic-model-driven query generator.
pub struct QuerySynthesizer {
    rng: Box<dyn RandomSource>,
    topics: Vec<TopicModel>,
}

impl QuerySynthesizer {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng, topics: topics::catalog() }
    }

    /// Synthesize one query at the requested complexity.
    ///
    /// Reuses the session's topic when one is already assigned; otherwise
    /// selects among enabled topics and caches the choice on the session so
    /// the rest of the session stays coherent.
    pub fn generate_query(
        &mut self,
        complexity: QueryComplexity,
        settings: &Settings,
        session: Option<&mut Session>,
    ) -> Result<String> {
        let topic = match session {
            Some(session) => {
                if let Some(topic) = session.topic {
                    topic
                } else {
                    let topic = self.select_random_topic(settings)?;
                    session.topic = Some(topic);
                    topic
                }
            }
            None => self.select_random_topic(settings)?,
        };

        let model_index = self
            .topics
            .iter()
            .position(|m| m.id == topic)
            .ok_or_else(|| ChaffError::Internal(format!("missing topic model: {topic}")))?;
        let model = self.topics[model_index].clone();

        let query = match complexity {
            QueryComplexity::Short => self.short_query(&model),
            QueryComplexity::Medium => self.medium_query(&model),
            QueryComplexity::Long => self.long_query(&model),
            QueryComplexity::VeryLong => self.very_long_query(&model),
        };

        trace!(%topic, ?complexity, %query, "synthesized query");
        Ok(query)
    }

    /// Uniform pick among topics the settings have not disabled.
    pub fn select_random_topic(&mut self, settings: &Settings) -> Result<TopicId> {
        let enabled = settings.enabled_topics();
        if enabled.is_empty() {
            return Err(ChaffError::InvalidInput("no topics enabled".into()));
        }
        Ok(*random::pick(self.rng.as_mut(), &enabled))
    }

    /// 1-2 words: usually a bare entity, sometimes keyword + entity.
    fn short_query(&mut self, model: &TopicModel) -> String {
        if random::chance(self.rng.as_mut(), 0.7) {
            (*random::pick(self.rng.as_mut(), model.entities)).to_string()
        } else {
            let keyword = random::pick(self.rng.as_mut(), model.keywords);
            let entity = random::pick(self.rng.as_mut(), model.entities);
            format!("{keyword} {entity}")
        }
    }

    /// 3-5 words: a filled template, occasionally suffixed the way real
    /// searchers pin recency or a community.
    fn medium_query(&mut self, model: &TopicModel) -> String {
        let template = random::pick(self.rng.as_mut(), model.templates);
        let keyword = random::pick(self.rng.as_mut(), model.keywords);
        let entity = random::pick(self.rng.as_mut(), model.entities);

        let mut query = template.replacen("{keyword}", keyword, 1).replacen("{entity}", entity, 1);

        if random::chance(self.rng.as_mut(), 0.2) {
            query.push_str(" 2024");
        } else if random::chance(self.rng.as_mut(), 0.1) {
            query.push_str(" reddit");
        }

        query
    }

    /// 6-10 words combining a start phrase, a keyword, and two entities.
    fn long_query(&mut self, model: &TopicModel) -> String {
        let start = random::pick(self.rng.as_mut(), START_PHRASES);
        let keyword = random::pick(self.rng.as_mut(), model.keywords);
        let entity = random::pick(self.rng.as_mut(), model.entities);
        let entity2 = random::pick(self.rng.as_mut(), model.entities);

        let patterns = [
            format!("{start} {keyword} {entity} {entity2}"),
            format!("{start} {entity} for {keyword} {entity2}"),
            format!("best {keyword} {entity} for {entity2}"),
            format!("{start} {keyword} {entity} without {entity2}"),
            format!("{keyword} {entity} vs {entity2} comparison"),
        ];
        random::pick(self.rng.as_mut(), &patterns).clone()
    }

    /// Full natural-language question.
    fn very_long_query(&mut self, model: &TopicModel) -> String {
        let entity = random::pick(self.rng.as_mut(), model.entities);
        let keyword = random::pick(self.rng.as_mut(), model.keywords);

        let patterns = [
            format!("what is the best way to {keyword} {entity} for beginners"),
            format!("how do i {keyword} {entity} without spending too much money"),
            format!("why does {entity} {keyword} and what can i do about it"),
            format!("where can i find the best {entity} {keyword} in my area"),
            format!("what are the benefits of {keyword} {entity} every day"),
            format!("how long does it take to {keyword} {entity} properly"),
            format!("is it safe to {keyword} {entity} at home"),
            format!("what should i know before {keyword} {entity} for the first time"),
        ];
        random::pick(self.rng.as_mut(), &patterns).clone()
    }

    /// Inject one plausible typo into a query.
    ///
    /// Identity on queries under three words and on target words under four
    /// characters; the first word is never touched, since users watch it
    /// most closely.
    pub fn add_typo(&mut self, query: &str) -> String {
        let mut words: Vec<String> = query.split(' ').map(str::to_string).collect();
        if words.len() < 3 {
            return query.to_string();
        }

        let word_index = random::pick_index(self.rng.as_mut(), words.len() - 1) + 1;
        let word: Vec<char> = words[word_index].chars().collect();
        if word.len() < 4 {
            return query.to_string();
        }

        let kind = self.rng.next_f64();
        let mutated = if kind < 0.4 {
            self.adjacent_key_typo(&word)
        } else if kind < 0.7 {
            // Doubled letter
            let pos = random::pick_index(self.rng.as_mut(), word.len());
            let mut out = word.clone();
            out.insert(pos, word[pos]);
            out
        } else if kind < 0.85 {
            // Deleted letter
            let pos = random::pick_index(self.rng.as_mut(), word.len());
            let mut out = word.clone();
            out.remove(pos);
            out
        } else {
            // Transposed adjacent letters
            let pos = random::pick_index(self.rng.as_mut(), word.len() - 1);
            let mut out = word.clone();
            out.swap(pos, pos + 1);
            out
        };

        words[word_index] = mutated.into_iter().collect();
        words.join(" ")
    }

    fn adjacent_key_typo(&mut self, word: &[char]) -> Vec<char> {
        let pos = random::pick_index(self.rng.as_mut(), word.len());
        let target = word[pos].to_ascii_lowercase();

        let Some((_, neighbors)) = KEY_NEIGHBORS.iter().find(|(key, _)| *key == target) else {
            return word.to_vec();
        };

        let mut out = word.to_vec();
        out[pos] = *random::pick(self.rng.as_mut(), neighbors);
        out
    }

    /// One of the fixed follow-up transformations, chosen uniformly.
    pub fn refine_query(&mut self, query: &str) -> String {
        let refine = random::pick(self.rng.as_mut(), REFINEMENTS);
        refine(query)
    }

    /// Apply per-topic enable toggles; content is never altered.
    pub fn update_topic_settings(&mut self, toggles: &BTreeMap<TopicId, bool>) {
        for model in &mut self.topics {
            if let Some(&enabled) = toggles.get(&model.id) {
                model.enabled = enabled;
            }
        }
    }

    pub fn topics(&self) -> &[TopicModel] {
        &self.topics
    }
}
