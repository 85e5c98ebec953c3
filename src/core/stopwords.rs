//! Stopword sets: built-in language lists plus an optional dataset file
//! (one word per line).

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};

use crate::core::tokenizer::Language;

const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

const GERMAN: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander",
    "andere", "anderem", "anderen", "anderer", "anderes", "anderm", "andern", "anderr", "anders",
    "auch", "auf", "aus", "bei", "bin", "bis", "bist", "da", "damit", "dann", "der", "den", "des",
    "dem", "die", "das", "dass", "derselbe", "derselben", "denselben", "desselben", "demselben",
    "dieselbe", "dieselben", "dasselbe", "dazu", "dein", "deine", "deinem", "deinen", "deiner",
    "deines", "denn", "derer", "dessen", "dich", "dir", "du", "dies", "diese", "diesem", "diesen",
    "dieser", "dieses", "doch", "dort", "durch", "ein", "eine", "einem", "einen", "einer",
    "eines", "einig", "einige", "einigem", "einigen", "einiger", "einiges", "einmal", "er", "ihn",
    "ihm", "es", "etwas", "euer", "eure", "eurem", "euren", "eurer", "eures", "fuer", "gegen",
    "gewesen", "hab", "habe", "haben", "hat", "hatte", "hatten", "hier", "hin", "hinter", "ich",
    "mich", "mir", "ihr", "ihre", "ihrem", "ihren", "ihrer", "ihres", "euch", "im", "in",
    "indem", "ins", "ist", "jede", "jedem", "jeden", "jeder", "jedes", "jene", "jenem", "jenen",
    "jener", "jenes", "jetzt", "kann", "kein", "keine", "keinem", "keinen", "keiner", "keines",
    "koennen", "koennte", "machen", "man", "manche", "manchem", "manchen", "mancher", "manches",
    "mein", "meine", "meinem", "meinen", "meiner", "meines", "mit", "muss", "musste", "nach",
    "nicht", "nichts", "noch", "nun", "nur", "ob", "oder", "ohne", "sehr", "sein", "seine",
    "seinem", "seinen", "seiner", "seines", "selbst", "sich", "sie", "ihnen", "sind", "so",
    "solche", "solchem", "solchen", "solcher", "solches", "soll", "sollte", "sondern", "sonst",
    "ueber", "um", "und", "uns", "unsere", "unserem", "unseren", "unser", "unseres", "unter",
    "viel", "vom", "von", "vor", "waehrend", "war", "waren", "warst", "was", "weg", "weil",
    "weiter", "welche", "welchem", "welchen", "welcher", "welches", "wenn", "werde", "werden",
    "wie", "wieder", "will", "wir", "wird", "wirst", "wo", "wollen", "wollte", "wuerde",
    "wuerden", "zu", "zum", "zur", "zwar", "zwischen",
];

/// Union of a language list and dataset-specific words
#[derive(Debug, Clone, Default)]
pub struct StopwordSet
{
    words: HashSet<String>,
}

impl StopwordSet
{
    pub fn for_language(lang: Language) -> Self
    {
        let builtin: &[&str] = match lang
        {
            Language::En => ENGLISH,
            Language::De => GERMAN,
            Language::Other => &[],
        };
        Self {
            words: builtin
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }

    /// Add dataset words from a file; a missing file adds nothing
    pub fn with_file(
        mut self,
        path: &Path,
    ) -> Result<Self>
    {
        if !path.is_file()
        {
            return Ok(self);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stopwords file: {}", path.display()))?;
        self.extend(content.lines());
        Ok(self)
    }

    pub fn extend<'a, I>(
        &mut self,
        words: I,
    ) where
        I: IntoIterator<Item = &'a str>,
    {
        self.words
            .extend(
                words
                    .into_iter()
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string),
            );
    }

    pub fn contains(
        &self,
        word: &str,
    ) -> bool
    {
        self.words
            .contains(word)
    }

    pub fn len(&self) -> usize
    {
        self.words
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.words
            .is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use super::*;

    #[test]
    fn language_lists()
    {
        let en = StopwordSet::for_language(Language::En);
        assert!(en.contains("the"));
        assert!(!en.contains("crash"));

        let de = StopwordSet::for_language(Language::De);
        assert!(de.contains("und"));
        assert!(!de.contains("the"));

        assert!(StopwordSet::for_language(Language::Other).is_empty());
    }

    #[test]
    fn dataset_file_is_merged()
    {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "eclipse\n  \nbug ").unwrap();

        let set = StopwordSet::for_language(Language::Other)
            .with_file(file.path())
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("eclipse"));
        assert!(set.contains("bug"));
    }

    #[test]
    fn missing_file_is_ignored()
    {
        let set = StopwordSet::for_language(Language::En)
            .with_file(Path::new("/definitely/not/here/stopwords"))
            .unwrap();
        assert!(set.contains("the"));
    }
}
