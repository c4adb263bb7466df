/// Profiler friendly benchmark of the Lax-Friedrichs RHS assembly on a 1D grid.

use criterion::{criterion_group, criterion_main, Criterion};

use hji_core::boundary::BoundaryCondition;
use hji_core::error::ContractError;
use hji_core::grid::{Grid, GridSpec, PhiField};
use hji_core::hamiltonian::Hamiltonian;
use hji_core::lax_friedrichs::{LaxFriedrichs, Term};
use hji_core::scheme_data::{Accuracy, DissipationKind, SchemeData};

struct Transport;

impl Hamiltonian for Transport {
    fn value(&mut self, _t: f64, _data: &PhiField, deriv_c: &[Vec<f64>], _grid: &Grid) -> Result<Vec<f64>, ContractError> {
        Ok(deriv_c[0].clone())
    }

    fn dissipation(
        &mut self,
        _t: f64,
        data: &PhiField,
        deriv_l: &[Vec<f64>],
        deriv_r: &[Vec<f64>],
        grid: &Grid,
        _diss_type: DissipationKind,
    ) -> Result<(Vec<f64>, f64), ContractError> {
        let diss: Vec<f64> = (0..data.len()).map(|i| (deriv_r[0][i] - deriv_l[0][i]) / 2.0).collect();
        Ok((diss, grid.dx(0)))
    }
}

fn rhs_once() {
    const NUM_THREADS: u32 = 4;
    let grid = Grid::from_spec(GridSpec::new(1).n(vec![512]).bdry(vec![BoundaryCondition::Periodic])).unwrap();
    let phi = PhiField::from_grid(&grid, |c| c[0].sin());
    let mut scheme = SchemeData::new(
        Grid::from_spec(GridSpec::new(1).n(vec![512]).bdry(vec![BoundaryCondition::Periodic])).unwrap(),
        Accuracy::VeryHigh,
        DissipationKind::Global,
        Box::new(Transport),
    );
    let term = Term::Leaf(LaxFriedrichs::new(NUM_THREADS));
    term.rhs(0.0, &phi, &mut scheme).unwrap();
}

fn my_benchmark(c: &mut Criterion) {
    c.bench_function("lax_friedrichs_rhs_1d_weno5", |b| b.iter(rhs_once));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = my_benchmark
}
criterion_main!(benches);
