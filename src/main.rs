// src/main.rs - Neon Playlist launcher

use rocket::launch;

use neon_playlist::Config;

#[launch]
fn rocket() -> rocket::Rocket<rocket::Build> {
    // Initialize logging
    env_logger::init();

    println!("============================================================");
    println!("Neon Playlist - upload, tag and queue your music");
    println!("============================================================");

    let config = Config::from_env();

    println!("Songs folder:  {}", config.songs_dir.display());
    println!("Metadata file: {}", config.metadata_file.display());
    if config.artist_lookup {
        println!("Artist lookup: {}", config.artist_lookup_url);
    } else {
        println!("Artist lookup: disabled");
    }

    let rocket = match neon_playlist::build_rocket(config.clone()) {
        Ok(rocket) => rocket,
        Err(e) => {
            eprintln!("Failed to open playlist session: {}", e);
            eprintln!("   Fix or remove {} and restart", config.metadata_file.display());
            std::process::exit(1);
        }
    };

    println!("🌐 Server starting at: http://{}", config.bind_address());
    println!("============================================================");

    rocket
}
