mod parser;
mod segmenter;
mod tagger;
