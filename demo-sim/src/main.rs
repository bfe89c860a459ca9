use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tools::{decode_packet_json, schema_json};
use clap::{Parser, ValueEnum};
use codec::{decode_update_packet, encode_update_packet, CodecLimits, UpdatePacket};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wire::{ClientBound, ClientMessage, InputFlags};
use world::{
    AiController, ClientId, Entity, EntityRef, Event, GameConfig, GameHooks, SpatialStrategy,
    World, WorldResult,
};

/// Hook id of the periodic shape respawn.
const RESPAWN_HOOK: u32 = 1;
const RESPAWN_EVERY: u32 = 10;
const PLAYER_SPEED: f32 = 2.5;

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic arena capture generator"
)]
struct Cli {
    /// Number of wandering shapes.
    #[arg(long, default_value_t = 64)]
    shapes: u32,
    /// Number of connected viewers, each with a player entity.
    #[arg(long, default_value_t = 4)]
    viewers: u32,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Optional JSON game config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the broad-phase strategy from the config.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
    /// Output directory for captures.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,
    /// Fail if p95 update packet size exceeds this value.
    #[arg(long)]
    max_p95_update_bytes: Option<u64>,
    /// Fail if average update packet size exceeds this value.
    #[arg(long)]
    max_avg_update_bytes: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Grid,
    QuadTree,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    config.seed = cli.seed;
    match cli.strategy {
        Some(StrategyArg::Grid) => config.spatial = SpatialStrategy::default(),
        Some(StrategyArg::QuadTree) => config.spatial = SpatialStrategy::quad_tree(),
        None => {}
    }
    let strategy = format!("{:?}", config.spatial);

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;
    write_schema_json(&cli.out_dir)?;

    let mut world = World::new(config).context("open arena")?;
    let mut rng = Pcg32::seed_from_u64(cli.seed ^ 0xC11E_17);

    let mut shapes = Vec::with_capacity(cli.shapes as usize);
    for _ in 0..cli.shapes {
        shapes.push(spawn_shape(&mut world)?);
    }

    let mut viewers = Vec::with_capacity(cli.viewers as usize);
    let mut players = BTreeMap::new();
    let bounds = world.bounds();
    for idx in 0..cli.viewers {
        let player = world.insert(player(idx, &mut rng, bounds))?;
        let client = world.add_viewer(player)?;
        world.add_controller(Wanderer { owner: player });
        let init = ClientMessage::Init {
            build: world.config().build.clone(),
            password: String::new(),
        };
        world.receive(client, &init.encode());
        players.insert(client, player);
        viewers.push(client);
    }
    world.set_hooks(DemoHooks { players, shapes });
    world.schedule(RESPAWN_EVERY, Event::Hook(RESPAWN_HOOK));

    let limits = CodecLimits::default();
    let mut summary = Summary::new(&cli, strategy);
    for tick in 1..=cli.ticks {
        for &client in &viewers {
            world.receive(client, &random_input(&mut rng).encode());
        }
        world.tick().with_context(|| format!("tick {tick}"))?;

        for (idx, &client) in viewers.iter().enumerate() {
            for bytes in world.take_outbox(client) {
                if bytes.first() != Some(&ClientBound::Update.id()) {
                    summary.push_control();
                    continue;
                }
                let path = cli.out_dir.join(format!("viewer{idx}_tick{tick:06}.bin"));
                write_packet(&path, &bytes)?;
                let packet = validate_packet(&limits, &bytes)?;
                summary.push_update(bytes.len() as u64, &packet);
            }
        }
    }

    summary.finalize();
    info!(
        updates = summary.update_count,
        avg_bytes = summary.avg_update_bytes,
        p95_bytes = summary.p95_update_bytes,
        "simulation finished"
    );
    summary.assert_budgets(cli.max_p95_update_bytes, cli.max_avg_update_bytes)?;
    write_summary_json(&cli.out_dir, &summary)?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn write_schema_json(out_dir: &Path) -> Result<()> {
    let path = out_dir.join("schema.json");
    let contents = serde_json::to_string_pretty(&schema_json()).context("serialize schema")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_packet(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

fn write_summary_json(out_dir: &Path, summary: &Summary) -> Result<()> {
    let path = out_dir.join("summary.json");
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Decodes a capture twice (codec and tools) and checks it re-encodes to
/// the same bytes.
fn validate_packet(limits: &CodecLimits, bytes: &[u8]) -> Result<UpdatePacket> {
    let packet = decode_update_packet(bytes, limits).context("decode update packet")?;
    let _ = decode_packet_json(bytes, limits).context("tools decode")?;
    let reencoded = encode_update_packet(&packet).context("re-encode update packet")?;
    if reencoded != bytes {
        anyhow::bail!("update packet for tick {} does not re-encode", packet.tick.raw());
    }
    Ok(packet)
}

fn spawn_shape(world: &mut World) -> WorldResult<EntityRef> {
    let (half_width, half_height) = world.bounds();
    let rng = world.rng();
    let x = rng.random_range(-half_width..half_width);
    let y = rng.random_range(-half_height..half_height);
    let sides = rng.random_range(3..=5);
    let size = rng.random_range(20.0..60.0);
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let spin = rng.random_range(-0.05..0.05);

    let mut entity = Entity::object();
    {
        let mut position = entity.attach_position();
        position.set_x(x);
        position.set_y(y);
        position.set_angle(angle);
    }
    {
        let mut physics = entity.attach_physics();
        physics.set_sides(sides);
        physics.set_size(size);
    }
    entity.attach_health().set_max_health(size * 2.0);
    entity.attach_style().set_color(8 + sides);
    world.insert_with(entity, move |shape: EntityRef, world: &mut World| -> WorldResult<()> {
        if let Some(mut position) = world.entity_mut(shape).and_then(Entity::position_mut) {
            let angle = position.angle() + spin;
            position.set_angle(angle);
        }
        Ok(())
    })
}

fn player(idx: u32, rng: &mut Pcg32, (half_width, half_height): (f32, f32)) -> Entity {
    let mut entity = Entity::object();
    {
        let mut position = entity.attach_position();
        position.set_x(rng.random_range(-half_width..half_width) / 2.0);
        position.set_y(rng.random_range(-half_height..half_height) / 2.0);
    }
    entity.attach_physics().set_size(50.0);
    entity.attach_name().set_name(&format!("viewer {idx}"));
    entity.attach_score();
    entity
}

fn random_input(rng: &mut Pcg32) -> ClientMessage {
    let directions = [
        InputFlags::UP,
        InputFlags::DOWN,
        InputFlags::LEFT,
        InputFlags::RIGHT,
    ];
    let mut flags = 0;
    for bit in directions {
        if rng.random_bool(0.3) {
            flags |= bit;
        }
    }
    ClientMessage::Input {
        flags: InputFlags::from_raw(flags),
        mouse_x: rng.random_range(-500.0..500.0),
        mouse_y: rng.random_range(-500.0..500.0),
    }
}

/// Steers players from their input and keeps the shape population churning.
struct DemoHooks {
    players: BTreeMap<ClientId, EntityRef>,
    shapes: Vec<EntityRef>,
}

impl GameHooks for DemoHooks {
    fn on_message(
        &mut self,
        world: &mut World,
        client: ClientId,
        message: ClientMessage,
    ) -> WorldResult<()> {
        let Some(&player) = self.players.get(&client) else {
            return Ok(());
        };
        if let ClientMessage::Input {
            flags,
            mouse_x,
            mouse_y,
        } = message
        {
            let axis = |neg: u32, pos: u32| {
                f32::from(u8::from(flags.contains(pos))) - f32::from(u8::from(flags.contains(neg)))
            };
            let ax = axis(InputFlags::LEFT, InputFlags::RIGHT);
            let ay = axis(InputFlags::UP, InputFlags::DOWN);
            world.accelerate(player, ax * PLAYER_SPEED, ay * PLAYER_SPEED);
            if let Some(mut position) = world.entity_mut(player).and_then(Entity::position_mut) {
                position.set_angle(mouse_y.atan2(mouse_x));
            }
        }
        Ok(())
    }

    fn on_event(&mut self, world: &mut World, hook: u32) -> WorldResult<()> {
        if hook != RESPAWN_HOOK || self.shapes.is_empty() {
            return Ok(());
        }
        let idx = world.rng().random_range(0..self.shapes.len());
        world.delete(self.shapes[idx]);
        self.shapes[idx] = spawn_shape(world)?;
        debug!(shape = ?self.shapes[idx], "shape respawned");
        world.schedule(RESPAWN_EVERY, Event::Hook(RESPAWN_HOOK));
        Ok(())
    }
}

/// Gives a player a small random drift on top of its input.
struct Wanderer {
    owner: EntityRef,
}

impl AiController for Wanderer {
    fn owner(&self) -> EntityRef {
        self.owner
    }

    fn tick(&mut self, world: &mut World) -> WorldResult<()> {
        let rng = world.rng();
        let ax = rng.random_range(-0.5..0.5);
        let ay = rng.random_range(-0.5..0.5);
        world.accelerate(self.owner, ax, ay);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    shapes: u32,
    viewers: u32,
    ticks: u32,
    seed: u64,
    strategy: String,
    update_count: u32,
    control_count: u32,
    update_bytes_total: u64,
    creations_total: u64,
    updates_total: u64,
    deletes_total: u64,
    avg_update_bytes: u64,
    p95_update_bytes: u64,
    #[serde(skip)]
    update_sizes: Vec<u64>,
}

impl Summary {
    fn new(cli: &Cli, strategy: String) -> Self {
        Self {
            shapes: cli.shapes,
            viewers: cli.viewers,
            ticks: cli.ticks,
            seed: cli.seed,
            strategy,
            update_count: 0,
            control_count: 0,
            update_bytes_total: 0,
            creations_total: 0,
            updates_total: 0,
            deletes_total: 0,
            avg_update_bytes: 0,
            p95_update_bytes: 0,
            update_sizes: Vec::new(),
        }
    }

    fn push_control(&mut self) {
        self.control_count += 1;
    }

    fn push_update(&mut self, bytes: u64, packet: &UpdatePacket) {
        self.update_count += 1;
        self.update_bytes_total += bytes;
        self.creations_total += packet.creations.len() as u64;
        self.updates_total += packet.updates.len() as u64;
        self.deletes_total += packet.deletes.len() as u64;
        self.update_sizes.push(bytes);
    }

    fn finalize(&mut self) {
        if self.update_count > 0 {
            self.avg_update_bytes = self.update_bytes_total / u64::from(self.update_count);
            self.update_sizes.sort_unstable();
            let idx = ((self.update_sizes.len() as f64) * 0.95).ceil() as usize;
            let idx = idx.saturating_sub(1).min(self.update_sizes.len() - 1);
            self.p95_update_bytes = self.update_sizes[idx];
        }
    }

    fn assert_budgets(&self, max_p95: Option<u64>, max_avg: Option<u64>) -> Result<()> {
        if let Some(max_p95) = max_p95 {
            if self.p95_update_bytes > max_p95 {
                anyhow::bail!(
                    "p95 update bytes {} exceeds budget {}",
                    self.p95_update_bytes,
                    max_p95
                );
            }
        }
        if let Some(max_avg) = max_avg {
            if self.avg_update_bytes > max_avg {
                anyhow::bail!(
                    "avg update bytes {} exceeds budget {}",
                    self.avg_update_bytes,
                    max_avg
                );
            }
        }
        Ok(())
    }
}
