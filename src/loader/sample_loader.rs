use crate::audio::{next_unit_id, SampleBuffer, UnitId};
use crate::catalog::{ListingSource, SoundDescriptor};
use crate::error::LoadError;

/// A catalog sound fetched, decoded and given a unit id, ready to be
/// registered with the engine and put on a channel.
#[derive(Clone, Debug)]
pub struct LoadedSound {
    pub sound: SoundDescriptor,
    pub unit: UnitId,
    pub buffer: SampleBuffer,
}

pub fn load(
    source: &dyn ListingSource,
    sound: &SoundDescriptor,
    target_rate: u32,
) -> Result<LoadedSound, LoadError> {
    let bytes = source.fetch(&sound.url).map_err(|e| LoadError::Fetch {
        name: sound.name.clone(),
        source: e,
    })?;

    let buffer = SampleBuffer::decode(&bytes, sound.extension().as_deref(), target_rate).map_err(|e| {
        LoadError::AudioDecode {
            name: sound.name.clone(),
            source: e,
        }
    })?;

    log::debug!(target: "loader", "decoded {} ({} frames)", sound.key, buffer.len());
    Ok(LoadedSound {
        sound: sound.clone(),
        unit: next_unit_id(),
        buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{list_sounds, DirSource};
    use crate::test_support::write_sound_tree;

    #[test]
    fn loads_a_catalog_sound() {
        let dir = tempfile::tempdir().unwrap();
        write_sound_tree(dir.path(), &[("KICK", "kick.wav")]);
        let source = DirSource::new(dir.path());
        let catalog = list_sounds(&source).unwrap();

        let loaded = load(&source, catalog.get("KICK/kick.wav").unwrap(), 44100).unwrap();
        assert_eq!(loaded.buffer.len(), 4);
        assert_eq!(loaded.sound.key, "KICK/kick.wav");
    }

    #[test]
    fn undecodable_payload_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("KICK")).unwrap();
        std::fs::write(dir.path().join("KICK/broken.wav"), b"this is not a wav file").unwrap();
        let source = DirSource::new(dir.path());
        let catalog = list_sounds(&source).unwrap();

        let err = load(&source, catalog.get("KICK/broken.wav").unwrap(), 44100).unwrap_err();
        assert!(matches!(err, LoadError::AudioDecode { .. }));
        assert_eq!(err.sound_name(), "broken.wav");
    }

    #[test]
    fn vanished_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        write_sound_tree(dir.path(), &[("KICK", "kick.wav")]);
        let source = DirSource::new(dir.path());
        let catalog = list_sounds(&source).unwrap();
        std::fs::remove_file(dir.path().join("KICK/kick.wav")).unwrap();

        let err = load(&source, catalog.get("KICK/kick.wav").unwrap(), 44100).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }
}
