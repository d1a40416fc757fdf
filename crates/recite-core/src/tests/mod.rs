mod audio;
mod recognition;
