mod broadcast;
mod preview;
