//! Chart adapters. Implements ChartPort.

pub mod plotters_chart;

pub use plotters_chart::PlottersChart;
