use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geoselect - Spatial selection by distance over vector layers
#[derive(Parser, Debug)]
#[command(name = "geoselect")]
#[command(about = "Select, reproject, join and aggregate vector layers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select features within a radius of a center point
    Select(SelectArgs),

    /// Reproject a layer into another CRS
    Reproject(ReprojectArgs),

    /// Join a record table onto a layer by key
    Join(JoinArgs),

    /// Count points falling in each polygon
    Aggregate(AggregateArgs),

    /// Show a layer's CRS, size, geometry types and attributes
    Inspect(InspectArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Reference layer file, or a directory holding it
    pub layer: PathBuf,

    /// Layer name when the reference path is a directory
    #[arg(long)]
    pub layer_name: Option<String>,

    /// Center as "X,Y" or WKT "POINT(X Y)" (EWKT "SRID=4326;POINT(X Y)" sets the CRS)
    #[arg(long, allow_hyphen_values = true)]
    pub center: String,

    /// CRS of the center coordinates (e.g. EPSG:4326)
    #[arg(long)]
    pub center_crs: Option<String>,

    /// Selection radius
    #[arg(long, allow_negative_numbers = true)]
    pub radius: f64,

    /// Radius unit (meters, km, mi, ft)
    #[arg(long)]
    pub unit: Option<String>,

    /// Projected CRS to evaluate the buffer in, when the reference layer is geographic
    #[arg(long)]
    pub working_crs: Option<String>,

    /// Prefilter candidates with an R-tree
    #[arg(long)]
    pub indexed: bool,

    /// Write the selected features to this GeoJSON file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Also write the buffer polygon to this GeoJSON file
    #[arg(long)]
    pub buffer_output: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Parser, Debug)]
pub struct ReprojectArgs {
    /// Layer file, or a directory holding it
    pub layer: PathBuf,

    /// Layer name when the path is a directory
    #[arg(long)]
    pub layer_name: Option<String>,

    /// Target CRS (e.g. EPSG:32618 or a PROJ string)
    #[arg(long)]
    pub to: String,

    /// Output GeoJSON file
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Parser, Debug)]
pub struct JoinArgs {
    /// Layer file, or a directory holding it
    pub layer: PathBuf,

    /// Record table: a JSON array of flat objects
    pub table: PathBuf,

    /// Layer to read when LAYER is a directory
    #[arg(long)]
    pub layer_name: Option<String>,

    /// Key attribute on the layer
    #[arg(long)]
    pub left_key: String,

    /// Key attribute in the table (defaults to the left key)
    #[arg(long)]
    pub right_key: Option<String>,

    /// Keep layer features without a matching record
    #[arg(long)]
    pub outer: bool,

    /// Output GeoJSON file
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Parser, Debug)]
pub struct AggregateArgs {
    /// Point layer
    pub points: PathBuf,

    /// Polygon layer
    pub polygons: PathBuf,

    /// Point layer to read when POINTS is a directory
    #[arg(long)]
    pub points_layer: Option<String>,

    /// Polygon layer to read when POLYGONS is a directory
    #[arg(long)]
    pub polygons_layer: Option<String>,

    /// Name of the count column added to each polygon
    #[arg(long, default_value = "point_count")]
    pub count_column: String,

    /// Numeric point attribute to sum and average per polygon
    #[arg(long)]
    pub sum_attribute: Option<String>,

    /// Output GeoJSON file
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Layer file, or a directory holding it
    pub layer: PathBuf,

    /// Layer name when the path is a directory
    #[arg(long)]
    pub layer_name: Option<String>,
}
